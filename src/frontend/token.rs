#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    String(std::string::String),

    // Keywords
    Print,
    Let,
    Fn,
    Return,
    If,
    Else,
    True,
    False,
    Null,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,

    // Identifier (variable or function name)
    Ident(std::string::String),

    Comment(std::string::String),
    Eof,
}

impl Token {
    /// Keyword lookup for identifier-shaped lexemes.
    pub fn keyword(word: &str) -> Option<Token> {
        match word {
            "print" => Some(Token::Print),
            "let" => Some(Token::Let),
            "fn" => Some(Token::Fn),
            "return" => Some(Token::Return),
            "if" => Some(Token::If),
            "else" => Some(Token::Else),
            "true" => Some(Token::True),
            "false" => Some(Token::False),
            "null" => Some(Token::Null),
            _ => None,
        }
    }
}
