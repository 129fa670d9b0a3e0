use crate::{
    errors::PathError,
    token::{Token, TokenType, EOQ},
};

use std::str::CharIndices;

enum State {
    Error,
    EndOfQuery,
    LexRoot,
    LexSegment,
    LexDescendantSegment,
    LexShorthandSegment,
    LexInsideBracketedSegment,
    LexInsideScript,
    LexInsideSingleQuotedString,
    LexInsideDoubleQuotedString,
}

/// A path expression tokenizer, producing a vector of tokens.
struct Lexer<'q> {
    query: &'q str,
    tokens: Vec<Token>,

    chars: CharIndices<'q>,
    start: usize,
    pos: usize,

    paren_depth: u32,
}

impl<'q> Lexer<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            tokens: Vec::new(),
            start: 0,
            pos: 0,
            chars: query.char_indices(),
            paren_depth: 0,
        }
    }

    fn run(&mut self) {
        let mut state = State::LexRoot;
        loop {
            match state {
                State::Error | State::EndOfQuery => break,
                State::LexRoot => state = lex_root(self),
                State::LexSegment => state = lex_segment(self),
                State::LexDescendantSegment => state = lex_descendant_segment(self),
                State::LexShorthandSegment => state = lex_shorthand_selector(self),
                State::LexInsideBracketedSegment => state = lex_inside_bracketed_segment(self),
                State::LexInsideScript => state = lex_inside_script(self),
                State::LexInsideSingleQuotedString => state = lex_string(self, '\''),
                State::LexInsideDoubleQuotedString => state = lex_string(self, '"'),
            }
        }
    }

    fn emit(&mut self, t: TokenType) {
        self.tokens.push(Token::new(t, self.start, self.pos));
        self.start = self.pos;
    }

    fn value(&self) -> &str {
        self.query
            .get(self.start..self.pos)
            .expect("lexer error: slice out of bounds or not on codepoint boundary")
    }

    fn boxed_value(&self) -> Box<str> {
        self.value().to_string().into_boxed_str()
    }

    fn next(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    fn ignore(&mut self) {
        self.start = self.pos;
    }

    fn peek(&mut self) -> char {
        if let Some((_, ch)) = self.chars.clone().next() {
            ch
        } else {
            EOQ
        }
    }

    fn accept(&mut self, ch: char) -> bool {
        if self.peek() == ch {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_if(&mut self, pred: impl FnOnce(char) -> bool) -> bool {
        if pred(self.peek()) {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_run(&mut self, pred: impl Fn(char) -> bool) -> bool {
        let mut accepted = false;
        while pred(self.peek()) {
            self.next();
            accepted = true;
        }
        accepted
    }

    fn ignore_whitespace(&mut self) -> bool {
        if self.accept_run(is_whitespace_char) {
            self.ignore();
            true
        } else {
            false
        }
    }

    fn error(&mut self, msg: String) -> State {
        self.tokens.push(Token::new(
            TokenType::Error {
                msg: msg.into_boxed_str(),
            },
            self.start,
            self.pos,
        ));
        State::Error
    }
}

pub fn tokenize(query: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(query);
    lexer.run();
    lexer.tokens
}

pub fn lex(query: &str) -> Result<Vec<Token>, PathError> {
    let tokens = tokenize(query);

    match tokens.last() {
        Some(Token {
            kind: TokenType::Error { msg },
            span,
            ..
        }) => Err(PathError::parse((*msg).to_string(), span.0)),
        _ => Ok(tokens),
    }
}

fn lex_root(l: &mut Lexer) -> State {
    if l.accept('$') {
        l.emit(TokenType::Root);
        State::LexSegment
    } else {
        let msg = format!("expected '$', found '{}'", l.next().unwrap_or(EOQ));
        l.error(msg)
    }
}

fn lex_segment(l: &mut Lexer) -> State {
    if l.ignore_whitespace() && l.peek() == EOQ {
        return l.error(String::from("unexpected trailing whitespace"));
    }

    if l.accept('.') {
        if l.accept('.') {
            l.emit(TokenType::DoubleDot);
            State::LexDescendantSegment
        } else {
            State::LexShorthandSegment
        }
    } else if l.accept('[') {
        l.emit(TokenType::LBracket);
        State::LexInsideBracketedSegment
    } else if l.accept('~') {
        l.emit(TokenType::Keys);
        State::LexSegment
    } else if l.peek() == EOQ {
        l.next();
        l.emit(TokenType::Eoq);
        State::EndOfQuery
    } else {
        let msg = format!(
            "expected '.', '..', a bracketed selection or '~', found '{}'",
            l.next().unwrap_or(EOQ)
        );
        l.error(msg)
    }
}

fn lex_descendant_segment(l: &mut Lexer) -> State {
    if l.accept('*') {
        l.emit(TokenType::Wild);
        State::LexSegment
    } else if l.accept('[') {
        l.emit(TokenType::LBracket);
        State::LexInsideBracketedSegment
    } else if l.accept_if(is_name_first) {
        l.accept_run(is_name_char);
        l.emit(TokenType::Name {
            value: l.boxed_value(),
        });
        State::LexSegment
    } else if l.peek() == EOQ {
        // a bare trailing descent, as in `$..`
        State::LexSegment
    } else {
        let msg = format!("unexpected descendant selection token '{}'", l.peek());
        l.error(msg)
    }
}

fn lex_shorthand_selector(l: &mut Lexer) -> State {
    l.ignore(); // ignore dot

    if l.accept_run(is_whitespace_char) {
        return l.error(String::from("unexpected whitespace after dot"));
    }

    if l.accept('[') {
        // dot accessors are non-greedy with respect to brackets, `.[` opens
        // an ordinary bracketed selection
        l.emit(TokenType::LBracket);
        State::LexInsideBracketedSegment
    } else if l.accept('*') {
        l.emit(TokenType::Wild);
        State::LexSegment
    } else if l.accept_if(is_name_first) {
        l.accept_run(is_name_char);
        l.emit(TokenType::Name {
            value: l.boxed_value(),
        });
        State::LexSegment
    } else {
        let msg = format!(
            "unexpected shorthand selector '{}'",
            l.next().unwrap_or(EOQ)
        );
        l.error(msg)
    }
}

fn lex_inside_bracketed_segment(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        ']' => {
            l.next();
            l.emit(TokenType::RBracket);
            State::LexSegment
        }
        '*' => {
            l.next();
            l.emit(TokenType::Wild);
            State::LexInsideBracketedSegment
        }
        '?' => {
            l.next();
            if l.accept('(') {
                l.emit(TokenType::Filter);
                l.paren_depth = 1;
                State::LexInsideScript
            } else {
                let msg = format!("expected '?(', found '?{}'", l.peek());
                l.error(msg)
            }
        }
        '(' => {
            l.next();
            l.emit(TokenType::LParen);
            l.paren_depth = 1;
            State::LexInsideScript
        }
        ',' => {
            l.next();
            l.emit(TokenType::Comma);
            State::LexInsideBracketedSegment
        }
        ':' => {
            l.next();
            l.emit(TokenType::Colon);
            State::LexInsideBracketedSegment
        }
        '-' => {
            // negative array index
            l.next();
            if l.accept_run(is_digit) {
                l.emit(TokenType::Index {
                    value: l.boxed_value(),
                });
                State::LexInsideBracketedSegment
            } else {
                let msg = format!("expected a digit after '-', found '{}'", l.peek());
                l.error(msg)
            }
        }
        EOQ => l.error(String::from("unclosed bracketed selection")),
        ch => {
            if l.accept_run(is_digit) {
                l.emit(TokenType::Index {
                    value: l.boxed_value(),
                });
                State::LexInsideBracketedSegment
            } else if l.accept_if(is_name_first) {
                // a bare property name selection
                l.accept_run(is_name_char);
                l.emit(TokenType::Name {
                    value: l.boxed_value(),
                });
                State::LexInsideBracketedSegment
            } else {
                let msg = format!("unexpected '{}' in bracketed selection", ch);
                l.error(msg)
            }
        }
    }
}

fn lex_inside_script(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        EOQ => l.error(String::from("unbalanced parentheses")),
        '(' => {
            l.next();
            l.emit(TokenType::LParen);
            l.paren_depth += 1;
            State::LexInsideScript
        }
        ')' => {
            l.next();
            l.emit(TokenType::RParen);
            l.paren_depth -= 1;
            if l.paren_depth == 0 {
                State::LexInsideBracketedSegment
            } else {
                State::LexInsideScript
            }
        }
        '\'' => {
            l.next();
            State::LexInsideSingleQuotedString
        }
        '"' => {
            l.next();
            State::LexInsideDoubleQuotedString
        }
        '@' => {
            l.next();
            l.accept_run(is_name_char);
            match l.value() {
                "@" => l.emit(TokenType::Current),
                "@property" => l.emit(TokenType::Property),
                value => {
                    let msg = format!("unknown current-node token '{}'", value);
                    return l.error(msg);
                }
            }
            State::LexInsideScript
        }
        '.' => {
            // a member access on `@`
            l.next();
            l.ignore(); // discard the dot
            if l.accept_if(is_name_first) {
                l.accept_run(is_name_char);
                l.emit(TokenType::Name {
                    value: l.boxed_value(),
                });
                State::LexInsideScript
            } else {
                let msg = format!("expected a member name after '.', found '{}'", l.peek());
                l.error(msg)
            }
        }
        '!' => {
            l.next();
            if l.accept('=') {
                if l.accept('=') {
                    l.emit(TokenType::StrictNe);
                } else {
                    l.emit(TokenType::Ne);
                }
            } else {
                l.emit(TokenType::Not);
            }
            State::LexInsideScript
        }
        '=' => {
            l.next();
            if l.accept('=') {
                if l.accept('=') {
                    l.emit(TokenType::StrictEq);
                } else {
                    l.emit(TokenType::Eq);
                }
                State::LexInsideScript
            } else {
                l.error(String::from("expected '==', found '='"))
            }
        }
        '<' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Le);
            } else {
                l.emit(TokenType::Lt);
            }
            State::LexInsideScript
        }
        '>' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Ge);
            } else {
                l.emit(TokenType::Gt);
            }
            State::LexInsideScript
        }
        '&' => {
            l.next();
            if l.accept('&') {
                l.emit(TokenType::And);
                State::LexInsideScript
            } else {
                l.error(String::from("unexpected '&', did you mean '&&'?"))
            }
        }
        '|' => {
            l.next();
            if l.accept('|') {
                l.emit(TokenType::Or);
                State::LexInsideScript
            } else {
                l.error(String::from("unexpected '|', did you mean '||'?"))
            }
        }
        '+' => {
            l.next();
            l.emit(TokenType::Plus);
            State::LexInsideScript
        }
        '-' => {
            l.next();
            l.emit(TokenType::Minus);
            State::LexInsideScript
        }
        '*' => {
            l.next();
            l.emit(TokenType::Star);
            State::LexInsideScript
        }
        '/' => {
            l.next();
            l.emit(TokenType::Slash);
            State::LexInsideScript
        }
        '%' => {
            l.next();
            l.emit(TokenType::Percent);
            State::LexInsideScript
        }
        _ => {
            if is_digit(l.peek()) {
                lex_number(l)
            } else if l.accept_run(is_keyword_char) {
                match l.value() {
                    "true" => l.emit(TokenType::True),
                    "false" => l.emit(TokenType::False),
                    "null" => l.emit(TokenType::Null),
                    value => {
                        let msg = format!("unknown keyword '{}'", value);
                        return l.error(msg);
                    }
                }
                State::LexInsideScript
            } else {
                let msg = format!("unexpected expression token '{}'", l.peek());
                l.error(msg)
            }
        }
    }
}

fn lex_string(l: &mut Lexer, quote: char) -> State {
    l.ignore(); // ignore open quote

    loop {
        match l.peek() {
            '\\' => {
                l.next();
                if !l.accept_if(|c| is_escape_char(c) || c == quote) {
                    return l.error(String::from("invalid escape sequence"));
                }
            }
            EOQ => {
                let msg = format!("unclosed string starting at index {}", l.start);
                return l.error(msg);
            }
            ch => {
                if ch == quote {
                    l.emit(match quote {
                        '\'' => TokenType::SingleQuoteString {
                            value: l.boxed_value(),
                        },
                        _ => TokenType::DoubleQuoteString {
                            value: l.boxed_value(),
                        },
                    });
                    l.next();
                    l.ignore(); // ignore closing quote
                    return State::LexInsideScript;
                }
                l.next();
            }
        }
    }
}

fn lex_number(l: &mut Lexer) -> State {
    if !l.accept_run(is_digit) {
        let msg = format!("expected a digit, found '{}'", l.peek());
        return l.error(msg);
    }

    if l.accept('.') {
        // a float
        if !l.accept_run(is_digit) {
            return l.error(String::from(
                "a fractional digit is required after a decimal point",
            ));
        }

        l.emit(TokenType::Float {
            value: l.boxed_value(),
        });
    } else {
        l.emit(TokenType::Int {
            value: l.boxed_value(),
        });
    }

    State::LexInsideScript
}

fn is_name_first(ch: char) -> bool {
    let code_point = ch as u32;
    (0x41..=0x5A).contains(&code_point)
        || code_point == 0x5F
        || (0x61..=0x7A).contains(&code_point)
        || code_point >= 0x80
}

fn is_name_char(ch: char) -> bool {
    let code_point = ch as u32;
    (0x30..=0x39).contains(&code_point)
        || (0x41..=0x5A).contains(&code_point)
        || code_point == 0x5F
        || (0x61..=0x7A).contains(&code_point)
        || code_point >= 0x80
}

fn is_digit(ch: char) -> bool {
    // 0-9
    let code_point = ch as u32;
    (0x30..=0x39).contains(&code_point)
}

fn is_keyword_char(ch: char) -> bool {
    // a-z
    let code_point = ch as u32;
    (0x61..=0x7A).contains(&code_point)
}

fn is_escape_char(ch: char) -> bool {
    matches!(ch, 'b' | 'f' | 'n' | 'r' | 't' | 'u' | '/' | '\\')
}

fn is_whitespace_char(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t')
}
