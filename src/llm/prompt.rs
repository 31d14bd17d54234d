const SYSTEM_PROMPT: &str = "\
The user will ask you to perform a task and you should use their computer to do so. \
After each step, take a screenshot and carefully evaluate if you have achieved the right outcome. \
Explicitly show your thinking: 'I have evaluated step X...' \
If not correct, try again. Only when you confirm a step was executed correctly should you move on to the next one. \
Note that you have to click into the browser address bar before typing a URL. \
You should always call a tool! Always return a tool call. \
Remember to call the finish tool when you have achieved the goal of the task. \
Do not explain you have finished the task, just call the tool. \
Use keyboard shortcuts to navigate whenever possible. \
Clicks happen at the current cursor position, so move the mouse to the target first. \
If the target window is not in focus, you may need to click on it before clicking on an element inside it.";

/// The system instruction sent with every request of a session.
pub fn system_prompt(additional: &str) -> String {
    let additional = additional.trim();
    if additional.is_empty() {
        SYSTEM_PROMPT.to_string()
    } else {
        format!("{SYSTEM_PROMPT}\n\nAdditional Instructions:\n{additional}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_addendum_keeps_base_prompt() {
        assert_eq!(system_prompt("   "), SYSTEM_PROMPT);
    }

    #[test]
    fn addendum_is_appended() {
        let prompt = system_prompt(" Use Firefox. ");
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with("\n\nAdditional Instructions:\nUse Firefox."));
    }
}
