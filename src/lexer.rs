use std::fmt::Display;

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    //keywords
    #[token("fn")]
    Function,

    #[token("let")]
    Let,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("return")]
    Return,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r#""[^"]*"?"#)]
    Str,

    //operators
    #[token("=")]
    Assign,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("!")]
    Bang,

    #[token("*")]
    Asterisk,

    #[token("/")]
    Slash,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("==")]
    Eq,

    #[token("!=")]
    NotEq,

    //delimiters
    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    Eof,

    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Illegal,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Function => "FUNCTION",
            TokenKind::Let => "LET",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Return => "RETURN",
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::Str => "STRING",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Bang => "!",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Eof => "EOF",
            TokenKind::Illegal => "ILLEGAL",
        };
        write!(f, "{}", name)
    }
}

/// A scanned token. String literals carry their contents without the quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub literal: &'a str,
}

impl<'a> Token<'a> {
    pub const EOF: Token<'static> = Token {
        kind: TokenKind::Eof,
        literal: "",
    };
}

/// Pull-based scanner over one source string.
///
/// `next_token` keeps handing out `Eof` once the input is exhausted; the
/// `Iterator` impl yields that `Eof` a single time and then ends.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            finished: false,
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        match self.inner.next() {
            Some(TokenKind::Str) => Token {
                kind: TokenKind::Str,
                literal: {
                    let slice = self.inner.slice();
                    let slice = slice.strip_prefix('"').unwrap_or(slice);
                    slice.strip_suffix('"').unwrap_or(slice)
                },
            },
            Some(kind) => Token {
                kind,
                literal: self.inner.slice(),
            },
            None => Token::EOF,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use TokenKind::*;

    fn lex(source: &str) -> Vec<(TokenKind, &str)> {
        Lexer::new(source).map(|t| (t.kind, t.literal)).collect()
    }

    #[test]
    fn scans_let_and_function_literals() {
        let input = "let five = 5;
let add = fn(x, y) {
  x + y;
};
let result = add(five, ten);";

        let expected = vec![
            (Let, "let"),
            (Ident, "five"),
            (Assign, "="),
            (Int, "5"),
            (Semicolon, ";"),
            (Let, "let"),
            (Ident, "add"),
            (Assign, "="),
            (Function, "fn"),
            (LParen, "("),
            (Ident, "x"),
            (Comma, ","),
            (Ident, "y"),
            (RParen, ")"),
            (LBrace, "{"),
            (Ident, "x"),
            (Plus, "+"),
            (Ident, "y"),
            (Semicolon, ";"),
            (RBrace, "}"),
            (Semicolon, ";"),
            (Let, "let"),
            (Ident, "result"),
            (Assign, "="),
            (Ident, "add"),
            (LParen, "("),
            (Ident, "five"),
            (Comma, ","),
            (Ident, "ten"),
            (RParen, ")"),
            (Semicolon, ";"),
            (Eof, ""),
        ];
        assert_eq!(lex(input), expected);
    }

    #[test]
    fn scans_operators_and_keywords() {
        let input = "!-/*5; 5 < 10 > 5; if (5 < 10) { return true; } else { return false; } 10 == 10; 10 != 9;";
        let kinds: Vec<TokenKind> = lex(input).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                Bang, Minus, Slash, Asterisk, Int, Semicolon, Int, Lt, Int, Gt, Int, Semicolon,
                If, LParen, Int, Lt, Int, RParen, LBrace, Return, True, Semicolon, RBrace, Else,
                LBrace, Return, False, Semicolon, RBrace, Int, Eq, Int, Semicolon, Int, NotEq,
                Int, Semicolon, Eof,
            ]
        );
    }

    #[test]
    fn scans_strings_and_brackets() {
        assert_eq!(
            lex(r#""foobar" "foo bar" [1, 2]"#),
            vec![
                (Str, "foobar"),
                (Str, "foo bar"),
                (LBracket, "["),
                (Int, "1"),
                (Comma, ","),
                (Int, "2"),
                (RBracket, "]"),
                (Eof, ""),
            ]
        );
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(lex(r#""abc def"#), vec![(Str, "abc def"), (Eof, "")]);
    }

    #[test]
    fn keywords_need_exact_match() {
        assert_eq!(
            lex("fnord letter if_"),
            vec![(Ident, "fnord"), (Ident, "letter"), (Ident, "if_"), (Eof, "")]
        );
    }

    #[test]
    fn unknown_characters_become_illegal() {
        assert_eq!(
            lex("5 @ 3"),
            vec![(Int, "5"), (Illegal, "@"), (Int, "3"), (Eof, "")]
        );
    }

    #[test]
    fn next_token_keeps_returning_eof() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().kind, Ident);
        assert_eq!(lexer.next_token(), Token::EOF);
        assert_eq!(lexer.next_token(), Token::EOF);
    }
}
