use crate::models::{Category, Priority};
use regex::Regex;

#[derive(Debug, PartialEq)]
pub struct ParsedTask {
    pub title: String,
    pub priority: Priority,
    pub category: Category,
}

/// Parses a quick-add line such as `Buy adapters !high #shopping`.
///
/// The first valid `!priority` and `#category` tokens are taken out of the
/// title; unrecognised tokens stay in it.
pub fn parse_task_input(input: &str) -> ParsedTask {
    let priority_re = Regex::new(r"(?:^|\s)!(\w+)").unwrap();
    let category_re = Regex::new(r"(?:^|\s)#(\w+)").unwrap();

    let mut removed = Vec::new();

    let mut priority = None;
    for caps in priority_re.captures_iter(input) {
        if let Ok(p) = caps[1].parse::<Priority>() {
            priority = Some(p);
            removed.push(caps.get(0).unwrap().range());
            break;
        }
    }

    let mut category = None;
    for caps in category_re.captures_iter(input) {
        if let Ok(c) = caps[1].parse::<Category>() {
            category = Some(c);
            removed.push(caps.get(0).unwrap().range());
            break;
        }
    }

    // cut from the back so earlier ranges stay valid
    removed.sort_by_key(|r| std::cmp::Reverse(r.start));
    let mut title = input.to_string();
    for range in removed {
        title.replace_range(range, " ");
    }

    let title = Regex::new(r"\s+")
        .unwrap()
        .replace_all(&title, " ")
        .trim()
        .to_string();

    ParsedTask {
        title,
        priority: priority.unwrap_or_default(),
        category: category.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_priority_in_middle() {
        let input = "Renew !urgent passports";
        let expected = ParsedTask {
            title: "Renew passports".to_string(),
            priority: Priority::Urgent,
            category: Category::Other,
        };
        assert_eq!(parse_task_input(input), expected);
    }

    #[test]
    fn test_parse_with_priority_and_category() {
        let input = "Buy plug adapters !high    #shopping";
        let expected = ParsedTask {
            title: "Buy plug adapters".to_string(),
            priority: Priority::High,
            category: Category::Shopping,
        };
        assert_eq!(parse_task_input(input), expected);
    }

    #[test]
    fn test_parse_without_tokens_uses_defaults() {
        let input = "  Check   the weather  ";
        let expected = ParsedTask {
            title: "Check the weather".to_string(),
            priority: Priority::Medium,
            category: Category::Other,
        };
        assert_eq!(parse_task_input(input), expected);
    }

    #[test]
    fn test_parse_keeps_unknown_tokens() {
        let input = "Visit #42 street !soon #food";
        let expected = ParsedTask {
            title: "Visit #42 street !soon".to_string(),
            priority: Priority::Medium,
            category: Category::Food,
        };
        assert_eq!(parse_task_input(input), expected);
    }

    #[test]
    fn test_parse_first_valid_priority_wins() {
        let input = "!low Pack snacks !high";
        let expected = ParsedTask {
            title: "Pack snacks !high".to_string(),
            priority: Priority::Low,
            category: Category::Other,
        };
        assert_eq!(parse_task_input(input), expected);
    }

    #[test]
    fn test_parse_ignores_embedded_markers() {
        let input = "Email hotel@beach re: room#2";
        let result = parse_task_input(input);
        assert_eq!(result.title, "Email hotel@beach re: room#2");
        assert_eq!(result.category, Category::Other);
    }
}
