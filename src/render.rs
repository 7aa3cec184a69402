//! HTML rendering for generated stories.

use crate::models::{ImageResult, PipelineResult};
use std::fmt::Write as _;

const HEADER: &str = "<html><head><style>
body { font-family: Arial, sans-serif; background-color: #f4f4f4; text-align: center; padding: 50px; }
h1 { color: #333; }
p { color: #555; }
img { max-width: 500px; height: auto; border: 1px solid #ddd; border-radius: 8px; }
</style></head><body>
<h1>Animal Story Generator</h1>
";

const FOOTER: &str = "</body></html>\n";

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the full page. Items whose image failed keep their story but get
/// no image block.
pub fn render_page(animal: &str, result: &PipelineResult) -> String {
    let mut page = String::from(HEADER);
    let animal = escape_html(animal);

    for item in result.iter() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            page,
            "<p>Story: {}</p>",
            escape_html(&item.completion.text)
        );
        if let ImageResult::Url(url) = &item.image {
            let _ = writeln!(page, "<p>Generated Image:</p>");
            let _ = writeln!(
                page,
                "<img src=\"{}\" alt=\"Generated Image of {}\">",
                escape_html(url),
                animal
            );
        }
    }

    page.push_str(FOOTER);
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Completion, StoryItem};
    use pretty_assertions::assert_eq;

    fn item(text: &str, image: ImageResult) -> StoryItem {
        StoryItem {
            completion: Completion::new(text),
            image,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_story_then_image() {
        let result = PipelineResult {
            items: vec![item(
                "A panda ate bamboo.",
                ImageResult::Url("https://img/x.png".to_string()),
            )],
        };

        let page = render_page("panda", &result);
        let story_at = page.find("<p>Story: A panda ate bamboo.</p>").unwrap();
        let img_at = page
            .find(r#"<img src="https://img/x.png" alt="Generated Image of panda">"#)
            .unwrap();
        assert!(story_at < img_at);
        assert!(page.contains("<h1>Animal Story Generator</h1>"));
        assert!(page.ends_with("</body></html>\n"));
    }

    #[test]
    fn test_render_failed_image_keeps_story() {
        let result = PipelineResult {
            items: vec![item("A lonely story.", ImageResult::failed("x", "y"))],
        };

        let page = render_page("owl", &result);
        assert!(page.contains("<p>Story: A lonely story.</p>"));
        assert!(!page.contains("<img"));
        assert!(!page.contains("Generated Image:"));
    }

    #[test]
    fn test_render_escapes_model_output() {
        let result = PipelineResult {
            items: vec![item(
                "<script>alert(1)</script>",
                ImageResult::Url("https://img/a.png?x=1&y=\"2\"".to_string()),
            )],
        };

        let page = render_page("<cat>", &result);
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("src=\"https://img/a.png?x=1&amp;y=&quot;2&quot;\""));
        assert!(page.contains("alt=\"Generated Image of &lt;cat&gt;\""));
    }

    #[test]
    fn test_render_empty_result_has_only_chrome() {
        let page = render_page("yak", &PipelineResult::default());
        assert!(!page.contains("Story:"));
        assert!(page.starts_with("<html>"));
    }
}
