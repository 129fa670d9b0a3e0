use std::fmt::{self, Write};

use crate::{errors::PathError, lexer::lex, parser::Parser};

use lazy_static::lazy_static;

lazy_static! {
    static ref PARSER: Parser = Parser::new();
}

/// A parsed path expression, an ordered sequence of segments applied to an
/// active set of matched nodes, left to right.
#[derive(Debug)]
pub struct Query {
    pub segments: Vec<Segment>,
}

impl Query {
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        Ok(Query {
            segments: PARSER.parse(lex(expr)?)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A query is singular when its syntax guarantees at most one match: every
    /// segment selects a single name, index or script index, or retrieves key
    /// names. Wildcards, descent, selector lists, filters and slices all make
    /// a query collection-shaped, whatever the data turns out to hold.
    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(|segment| match segment {
            Segment::Child { selectors } => {
                selectors.len() == 1
                    && selectors.first().is_some_and(|selector| {
                        matches!(
                            selector,
                            Selector::Name { .. } | Selector::Index { .. } | Selector::Script { .. }
                        )
                    })
            }
            Segment::Recursive { .. } => false,
            Segment::Keys => true,
        })
    }

    /// The first script or filter expression in this query, if any.
    pub fn first_script(&self) -> Option<&Expression> {
        for segment in self.segments.iter() {
            let selectors = match segment {
                Segment::Child { selectors } | Segment::Recursive { selectors } => selectors,
                Segment::Keys => continue,
            };

            for selector in selectors {
                if let Selector::Script { expression } | Selector::Filter { expression } = selector
                {
                    return Some(expression);
                }
            }
        }

        None
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}",
            self.segments
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>()
                .join("")
        )
    }
}

#[derive(Debug)]
pub enum Segment {
    /// A shorthand or bracketed selection. Multiple selectors emit one match
    /// per selector per input node, in listed order.
    Child { selectors: Vec<Selector> },
    /// `..`, with any trailing selectors applied to every visited node and
    /// the results flattened. An empty selector list is a bare descent.
    Recursive { selectors: Vec<Selector> },
    /// A trailing `~`, selecting the key of each match instead of its value.
    Keys,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Child { selectors } => match selectors.as_slice() {
                [Selector::Name { name }] => write!(f, ".{name}"),
                [Selector::Wild] => f.write_str(".*"),
                _ => write!(
                    f,
                    "[{}]",
                    selectors
                        .iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<String>>()
                        .join(",")
                ),
            },
            Segment::Recursive { selectors } => match selectors.as_slice() {
                [] => f.write_str(".."),
                [Selector::Name { name }] => write!(f, "..{name}"),
                [Selector::Wild] => f.write_str("..*"),
                _ => write!(
                    f,
                    "..[{}]",
                    selectors
                        .iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<String>>()
                        .join(",")
                ),
            },
            Segment::Keys => f.write_char('~'),
        }
    }
}

#[derive(Debug)]
pub enum Selector {
    Name {
        name: String,
    },
    Index {
        index: isize,
    },
    Slice {
        start: Option<isize>,
        stop: Option<isize>,
        step: Option<isize>,
    },
    Wild,
    Script {
        expression: Box<Expression>,
    },
    Filter {
        expression: Box<Expression>,
    },
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name { name } => f.write_str(name),
            Selector::Index { index } => write!(f, "{index}"),
            Selector::Slice { start, stop, step } => {
                write!(
                    f,
                    "{}:{}",
                    start.map(|i| i.to_string()).unwrap_or_default(),
                    stop.map(|i| i.to_string()).unwrap_or_default(),
                )?;
                if let Some(step) = step {
                    write!(f, ":{step}")?;
                }
                Ok(())
            }
            Selector::Wild => f.write_char('*'),
            Selector::Script { expression } => write!(f, "({expression})"),
            Selector::Filter { expression } => write!(f, "?({expression})"),
        }
    }
}

#[derive(Debug)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("&&"),
            LogicalOperator::Or => f.write_str("||"),
        }
    }
}

#[derive(Debug)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Ge,
    Gt,
    Le,
    Lt,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Eq => f.write_str("=="),
            ComparisonOperator::Ne => f.write_str("!="),
            ComparisonOperator::StrictEq => f.write_str("==="),
            ComparisonOperator::StrictNe => f.write_str("!=="),
            ComparisonOperator::Ge => f.write_str(">="),
            ComparisonOperator::Gt => f.write_str(">"),
            ComparisonOperator::Le => f.write_str("<="),
            ComparisonOperator::Lt => f.write_str("<"),
        }
    }
}

#[derive(Debug)]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithmeticOperator::Add => f.write_str("+"),
            ArithmeticOperator::Sub => f.write_str("-"),
            ArithmeticOperator::Mul => f.write_str("*"),
            ArithmeticOperator::Div => f.write_str("/"),
            ArithmeticOperator::Mod => f.write_str("%"),
        }
    }
}

#[derive(Debug)]
pub enum ExpressionType {
    True,
    False,
    Null,
    String {
        value: String,
    },
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    /// The current node, with an optional member path: `@`, `@.a.b`,
    /// `@.length`.
    Current {
        path: Vec<String>,
    },
    /// `@property`, the key or index of the current node.
    Property,
    Not {
        expression: Box<Expression>,
    },
    Negate {
        expression: Box<Expression>,
    },
    Logical {
        left: Box<Expression>,
        operator: LogicalOperator,
        right: Box<Expression>,
    },
    Comparison {
        left: Box<Expression>,
        operator: ComparisonOperator,
        right: Box<Expression>,
    },
    Arithmetic {
        left: Box<Expression>,
        operator: ArithmeticOperator,
        right: Box<Expression>,
    },
}

/// A script or filter expression, tagged with the offset of its first token
/// for error reporting.
#[derive(Debug)]
pub struct Expression {
    pub kind: ExpressionType,
    pub index: usize,
}

impl Expression {
    pub fn new(kind: ExpressionType, index: usize) -> Self {
        Expression { kind, index }
    }

    pub fn is_literal(&self) -> bool {
        use ExpressionType::*;
        matches!(
            self.kind,
            True | False | Null | String { .. } | Int { .. } | Float { .. }
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionType::True => f.write_str("true"),
            ExpressionType::False => f.write_str("false"),
            ExpressionType::Null => f.write_str("null"),
            ExpressionType::String { value } => write!(f, "'{value}'"),
            ExpressionType::Int { value } => write!(f, "{value}"),
            ExpressionType::Float { value } => write!(f, "{value}"),
            ExpressionType::Current { path } => {
                f.write_char('@')?;
                for name in path {
                    write!(f, ".{name}")?;
                }
                Ok(())
            }
            ExpressionType::Property => f.write_str("@property"),
            ExpressionType::Not { expression } => write!(f, "!{expression}"),
            ExpressionType::Negate { expression } => write!(f, "-{expression}"),
            ExpressionType::Logical {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
            ExpressionType::Comparison {
                left,
                operator,
                right,
            } => write!(f, "{left} {operator} {right}"),
            ExpressionType::Arithmetic {
                left,
                operator,
                right,
            } => write!(f, "{left}{operator}{right}"),
        }
    }
}
