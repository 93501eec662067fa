use crate::domain::Category;

/// Recognized slash commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/gasto`.
    StartExpense,
    Help,
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parse text starting with `/`; `None` for plain answers.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }
        let (name, _args) = parse_command(text);
        Some(match name.as_str() {
            "start" | "gasto" => Command::StartExpense,
            "help" => Command::Help,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(name),
        })
    }
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub fn help_text() -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "🤖 Assistente Financeiro Bot\n\n\
         Comandos:\n\
         /gasto - Registrar um novo gasto\n\
         /cancel - Cancelar o registro em andamento\n\
         /help - Mostrar esta ajuda\n\n\
         Fluxo:\n\
         1. /gasto → Digite o item\n\
         2. Digite o valor (ex: 300,00)\n\
         3. Escolha a data\n\
         4. Escolha a categoria\n\n\
         Categorias:\n{categories}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::StartExpense));
        assert_eq!(Command::parse("/gasto"), Some(Command::StartExpense));
        assert_eq!(Command::parse("/GASTO@fin_bot"), Some(Command::StartExpense));
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/cancel now"), Some(Command::Cancel));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("Café"), None);
        assert_eq!(Command::parse("12,50"), None);
    }

    #[test]
    fn unknown_commands_keep_their_name() {
        assert_eq!(
            Command::parse("/stats"),
            Some(Command::Unknown("stats".to_string()))
        );
    }

    #[test]
    fn help_lists_every_category() {
        let help = help_text();
        for c in Category::ALL {
            assert!(help.contains(c.label()));
        }
    }
}
