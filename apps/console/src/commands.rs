/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Categories,
    Pick(String),
    Dealer,
    History,
    Where,
    Help,
    Quit,
    Message(String),
    Nothing,
}

pub const HELP: &str = "\
/categories        list categories
/pick <n|label>    jump to a random place in a category
/dealer            let the oracle pick a place
/history           places visited so far
/where             current place
/quit              leave
anything else is sent to the oracle";

pub fn parse_line(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleCommand::Nothing);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ConsoleCommand::Message(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "categories" | "c" => Ok(ConsoleCommand::Categories),
        "pick" | "p" if !arg.is_empty() => Ok(ConsoleCommand::Pick(arg.to_string())),
        "pick" | "p" => Err("usage: /pick <n|label>".to_string()),
        "dealer" | "d" => Ok(ConsoleCommand::Dealer),
        "history" | "h" => Ok(ConsoleCommand::History),
        "where" | "w" => Ok(ConsoleCommand::Where),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "q" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(format!("unknown command '/{other}', try /help")),
    }
}

/// Resolves a 1-based index or a label. Labels match exactly first, then
/// case-insensitively ignoring any leading emoji.
pub fn resolve_category<'a>(labels: &[&'a str], arg: &str) -> Option<&'a str> {
    if let Ok(index) = arg.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| labels.get(i)).copied();
    }
    if let Some(label) = labels.iter().find(|label| **label == arg) {
        return Some(*label);
    }
    let wanted = arg.to_lowercase();
    labels
        .iter()
        .find(|label| bare_label(label).to_lowercase() == wanted)
        .copied()
}

fn bare_label(label: &str) -> &str {
    label
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim()
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
