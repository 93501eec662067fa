use std::fmt;

/// Messenger user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messenger chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Messenger message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Expense categories, in the order the sheet uses them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Housing,
    Food,
    LoanPayment,
    Investment,
    CreditCard,
    Transport,
    Services,
    Leisure,
    Health,
    Education,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Housing,
        Category::Food,
        Category::LoanPayment,
        Category::Investment,
        Category::CreditCard,
        Category::Transport,
        Category::Services,
        Category::Leisure,
        Category::Health,
        Category::Education,
        Category::Other,
    ];

    /// Label as it appears on the keyboard and in the sheet.
    pub fn label(self) -> &'static str {
        match self {
            Category::Housing => "Moradia",
            Category::Food => "Alimentação",
            Category::LoanPayment => "Empréstimo",
            Category::Investment => "Investimento",
            Category::CreditCard => "Cartão de crédito",
            Category::Transport => "Transporte",
            Category::Services => "Serviços",
            Category::Leisure => "Lazer",
            Category::Health => "Saúde",
            Category::Education => "Educação",
            Category::Other => "Outros",
        }
    }

    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|c| c.label().to_string()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A finished expense, produced by a completed conversation.
///
/// Fields are kept as the user typed them; validation happens when the
/// record is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseRecord {
    pub description: String,
    pub amount_raw: String,
    pub date_text: String,
    pub category: String,
}
