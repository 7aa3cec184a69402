use crate::models::PromptMessage;

pub const STORY_SYSTEM: &str = include_str!("../data/prompts/story_system.txt");
pub const STORY_USER: &str = include_str!("../data/prompts/story_user.txt");
pub const IMAGE_DESCRIPTION: &str = include_str!("../data/prompts/image_description.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// The fixed two-message prompt asking for a short story about `animal`.
pub fn story_messages(animal: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(STORY_SYSTEM),
        PromptMessage::user(render(STORY_USER, &[("animal", animal)])),
    ]
}

/// Image description derived from one generated story.
pub fn image_description(story: &str) -> String {
    render(IMAGE_DESCRIPTION, &[("story", story)])
}
