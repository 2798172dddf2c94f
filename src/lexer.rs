//! Tokenizer. Operates on a single source line at a time — the line
//! dispatcher re-lexes a fresh line on every call, and macro expansion
//! re-tokenizes stored body text fresh on every expansion (see the
//! "stable token streams" open-question resolution in macro collection).
//!
//! The token stream supports a one-token peek plus save/restore of the
//! cursor, which is all the operand parser's condition-code disambiguation
//! needs for its bounded lookahead.

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(i64),
    Str(String),
    Char(i64),
    Dollar,
    Comma,
    Colon,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    Amp,
    Caret,
    Pipe,
    AmpAmp,
    PipePipe,
    Tilde,
    Bang,
    Hash,
    Assign,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub column: usize,
}

pub struct Lexer {
    tokens: Vec<Token>,
    pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerMark(usize);

impl Lexer {
    pub fn tokenize(line: &str) -> Result<Lexer, String> {
        let tokens = lex(line)?;
        Ok(Lexer { tokens, pos: 0 })
    }

    pub fn mark(&self) -> LexerMark {
        LexerMark(self.pos)
    }

    pub fn restore(&mut self, mark: LexerMark) {
        self.pos = mark.0;
    }

    pub fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Peeks one token past the current one, without consuming either.
    pub fn peek_ahead(&self) -> &TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    pub fn next(&mut self) -> TokenKind {
        let tok = self
            .tokens
            .get(self.pos)
            .map(|t| t.kind.clone())
            .unwrap_or(TokenKind::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    pub fn expect(&mut self, kind: &TokenKind) -> Result<(), String> {
        let next = self.next();
        if &next == kind {
            Ok(())
        } else {
            Err(format!("expected {kind:?}, found {next:?}"))
        }
    }

    /// Column (1-based) of the first remaining token, for diagnostics.
    pub fn column(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.column).unwrap_or(0)
    }
}

/// Strips a `;`-introduced comment, respecting string/char literals so a
/// `;` inside `"..."` doesn't truncate the line.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_str = false;
    let mut in_char = false;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' if !in_char => in_str = !in_str,
            b'\'' if !in_str => in_char = !in_char,
            b';' if !in_str && !in_char => return &line[..i],
            _ => {}
        }
    }
    line
}

fn lex(line: &str) -> Result<Vec<Token>, String> {
    let line = strip_comment(line);
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '"' {
            let (s, next) = lex_string(&chars, i)?;
            tokens.push(Token {
                kind: TokenKind::Str(s),
                column,
            });
            i = next;
            continue;
        }

        if c == '\'' {
            let (value, next) = lex_char(&chars, i)?;
            tokens.push(Token {
                kind: TokenKind::Char(value),
                column,
            });
            i = next;
            continue;
        }

        if c == '$' {
            if i + 1 < chars.len() && chars[i + 1].is_ascii_hexdigit() {
                let (value, next) = lex_number_radix(&chars, i + 1, 16)?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    column,
                });
                i = next;
            } else {
                tokens.push(Token {
                    kind: TokenKind::Dollar,
                    column,
                });
                i += 1;
            }
            continue;
        }

        if c == '%' && i + 1 < chars.len() && (chars[i + 1] == '0' || chars[i + 1] == '1') {
            let (value, next) = lex_number_radix(&chars, i + 1, 2)?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                column,
            });
            i = next;
            continue;
        }

        if c.is_ascii_digit() {
            let (kind, next) = lex_decimal_or_suffixed(&chars, i)?;
            tokens.push(Token { kind, column });
            i = next;
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '.' {
            let (ident, next) = lex_ident(&chars, i);
            if ident.len() > 256 {
                return Err("identifier exceeds 256 bytes".to_string());
            }
            tokens.push(Token {
                kind: TokenKind::Ident(ident),
                column,
            });
            i = next;
            continue;
        }

        let (kind, width) = lex_punct(&chars, i)?;
        tokens.push(Token { kind, column });
        i += width;
    }

    Ok(tokens)
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let mut i = start + 1;
    let mut s = String::new();
    while i < chars.len() {
        if chars[i] == '"' {
            return Ok((s, i + 1));
        }
        s.push(chars[i]);
        i += 1;
    }
    Err("unterminated string".to_string())
}

fn lex_char(chars: &[char], start: usize) -> Result<(i64, usize), String> {
    let mut i = start + 1;
    let mut value: i64 = 0;
    let mut any = false;
    while i < chars.len() {
        if chars[i] == '\'' {
            if !any {
                return Err("empty character literal".to_string());
            }
            return Ok((value, i + 1));
        }
        value = (value << 8) | i64::from(chars[i] as u32 & 0xFF);
        any = true;
        i += 1;
    }
    Err("unterminated character literal".to_string())
}

fn lex_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start;
    let mut s = String::new();
    while i < chars.len()
        && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.' || chars[i] == '\'')
    {
        s.push(chars[i]);
        i += 1;
    }
    (s, i)
}

fn lex_number_radix(chars: &[char], start: usize, radix: u32) -> Result<(i64, usize), String> {
    let mut i = start;
    let mut s = String::new();
    while i < chars.len() && (chars[i].is_digit(radix) || chars[i] == '_') {
        if chars[i] != '_' {
            s.push(chars[i]);
        }
        i += 1;
    }
    if s.is_empty() {
        return Err("malformed numeric literal".to_string());
    }
    let value =
        i64::from_str_radix(&s, radix).map_err(|_| "malformed numeric literal".to_string())?;
    Ok((value, i))
}

/// Lexes a run starting with a decimal digit, which may turn out to be:
/// plain decimal, `0x...` hex, an `H`-suffixed hex literal, or a
/// `B`-suffixed binary literal.
fn lex_decimal_or_suffixed(chars: &[char], start: usize) -> Result<(TokenKind, usize), String> {
    if chars[start] == '0'
        && start + 1 < chars.len()
        && (chars[start + 1] == 'x' || chars[start + 1] == 'X')
    {
        let (value, next) = lex_number_radix(chars, start + 2, 16)?;
        return Ok((TokenKind::Number(value), next));
    }

    let mut i = start;
    let mut s = String::new();
    while i < chars.len() && (chars[i].is_ascii_hexdigit() || chars[i] == '_') {
        if chars[i] != '_' {
            s.push(chars[i]);
        }
        i += 1;
    }

    if i < chars.len() && (chars[i] == 'H' || chars[i] == 'h') {
        let value = i64::from_str_radix(&s, 16).map_err(|_| "malformed hex literal".to_string())?;
        return Ok((TokenKind::Number(value), i + 1));
    }

    if i < chars.len() && (chars[i] == 'B' || chars[i] == 'b') && s.chars().all(|c| c == '0' || c == '1')
    {
        let value = i64::from_str_radix(&s, 2).map_err(|_| "malformed binary literal".to_string())?;
        return Ok((TokenKind::Number(value), i + 1));
    }

    // Not hex/binary after all: re-lex as plain decimal digits only.
    let mut j = start;
    let mut dec = String::new();
    while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '_') {
        if chars[j] != '_' {
            dec.push(chars[j]);
        }
        j += 1;
    }
    let value = dec.parse::<i64>().map_err(|_| "malformed numeric literal".to_string())?;
    Ok((TokenKind::Number(value), j))
}

fn lex_punct(chars: &[char], i: usize) -> Result<(TokenKind, usize), String> {
    let two: Option<&str> = if i + 1 < chars.len() {
        match (chars[i], chars[i + 1]) {
            ('<', '<') => Some("<<"),
            ('>', '>') => Some(">>"),
            ('<', '=') => Some("<="),
            ('>', '=') => Some(">="),
            ('=', '=') => Some("=="),
            ('!', '=') => Some("!="),
            ('&', '&') => Some("&&"),
            ('|', '|') => Some("||"),
            _ => None,
        }
    } else {
        None
    };

    if let Some(op) = two {
        let kind = match op {
            "<<" => TokenKind::Shl,
            ">>" => TokenKind::Shr,
            "<=" => TokenKind::Le,
            ">=" => TokenKind::Ge,
            "==" => TokenKind::EqEq,
            "!=" => TokenKind::Ne,
            "&&" => TokenKind::AmpAmp,
            "||" => TokenKind::PipePipe,
            _ => unreachable!(),
        };
        return Ok((kind, 2));
    }

    let kind = match chars[i] {
        ',' => TokenKind::Comma,
        ':' => TokenKind::Colon,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        '&' => TokenKind::Amp,
        '^' => TokenKind::Caret,
        '|' => TokenKind::Pipe,
        '~' => TokenKind::Tilde,
        '!' => TokenKind::Bang,
        '#' => TokenKind::Hash,
        '=' => TokenKind::Assign,
        other => return Err(format!("invalid character '{other}'")),
    };
    Ok((kind, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<TokenKind> {
        let lexer = Lexer::tokenize(line).unwrap();
        lexer.tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_hex_forms() {
        assert_eq!(kinds("$1A3"), vec![TokenKind::Number(0x1A3)]);
        assert_eq!(kinds("0x1A3"), vec![TokenKind::Number(0x1A3)]);
        assert_eq!(kinds("1A3H"), vec![TokenKind::Number(0x1A3)]);
    }

    #[test]
    fn lexes_binary_forms() {
        assert_eq!(kinds("%1011"), vec![TokenKind::Number(0b1011)]);
        assert_eq!(kinds("1011B"), vec![TokenKind::Number(0b1011)]);
    }

    #[test]
    fn lexes_decimal() {
        assert_eq!(kinds("123"), vec![TokenKind::Number(123)]);
    }

    #[test]
    fn lexes_multi_byte_char_literal_big_endian() {
        assert_eq!(kinds("'AB'"), vec![TokenKind::Char(0x4142)]);
    }

    #[test]
    fn dollar_alone_is_pc_not_hex() {
        assert_eq!(kinds("$"), vec![TokenKind::Dollar]);
        assert_eq!(kinds("$ + 1"), vec![TokenKind::Dollar, TokenKind::Plus, TokenKind::Number(1)]);
    }

    #[test]
    fn strips_semicolon_comments_but_not_inside_strings() {
        assert_eq!(kinds("NOP ; a comment"), vec![TokenKind::Ident("NOP".to_string())]);
        assert_eq!(
            kinds("DB \"a;b\""),
            vec![TokenKind::Ident("DB".to_string()), TokenKind::Str("a;b".to_string())]
        );
    }

    #[test]
    fn save_restore_rewinds_cursor() {
        let mut lexer = Lexer::tokenize("A, B").unwrap();
        let mark = lexer.mark();
        lexer.next();
        lexer.next();
        lexer.restore(mark);
        assert_eq!(lexer.next(), TokenKind::Ident("A".to_string()));
    }

    #[test]
    fn identifier_over_256_bytes_is_rejected() {
        let long_ident = "A".repeat(257);
        assert!(Lexer::tokenize(&long_ident).is_err());
    }
}
