use std::fmt;
use std::str::FromStr;

/// Python operator precedence, using the classes of Blockly's Python generator.
/// Lower binds tighter; `None` means "no enclosing parens were added".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Atomic,
    Collection,
    StringConversion,
    Member,
    FunctionCall,
    Exponentiation,
    UnarySign,
    BitwiseNot,
    Multiplicative,
    Additive,
    BitwiseShift,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    Relational,
    LogicalNot,
    LogicalAnd,
    LogicalOr,
    Conditional,
    Lambda,
    None,
}

/// `(outer, inner)` pairs that read the same with or without parentheses.
const ORDER_OVERRIDES: &[(Order, Order)] = &[
    (Order::FunctionCall, Order::Member),
    (Order::FunctionCall, Order::FunctionCall),
    (Order::Member, Order::Member),
    (Order::Member, Order::FunctionCall),
    (Order::LogicalNot, Order::LogicalNot),
    (Order::LogicalAnd, Order::LogicalAnd),
    (Order::LogicalOr, Order::LogicalOr),
];

impl Order {
    /// Precedence class. `Member` and `FunctionCall` share class 2.
    pub fn class(self) -> u8 {
        match self {
            Order::Atomic => 0,
            Order::Collection | Order::StringConversion => 1,
            Order::Member | Order::FunctionCall => 2,
            Order::Exponentiation => 3,
            Order::UnarySign | Order::BitwiseNot => 4,
            Order::Multiplicative => 5,
            Order::Additive => 6,
            Order::BitwiseShift => 7,
            Order::BitwiseAnd => 8,
            Order::BitwiseXor => 9,
            Order::BitwiseOr => 10,
            Order::Relational => 11,
            Order::LogicalNot => 12,
            Order::LogicalAnd => 13,
            Order::LogicalOr => 14,
            Order::Conditional => 15,
            Order::Lambda => 16,
            Order::None => 99,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Order::Atomic => "atomic",
            Order::Collection => "collection",
            Order::StringConversion => "string_conversion",
            Order::Member => "member",
            Order::FunctionCall => "function_call",
            Order::Exponentiation => "exponentiation",
            Order::UnarySign => "unary_sign",
            Order::BitwiseNot => "bitwise_not",
            Order::Multiplicative => "multiplicative",
            Order::Additive => "additive",
            Order::BitwiseShift => "bitwise_shift",
            Order::BitwiseAnd => "bitwise_and",
            Order::BitwiseXor => "bitwise_xor",
            Order::BitwiseOr => "bitwise_or",
            Order::Relational => "relational",
            Order::LogicalNot => "logical_not",
            Order::LogicalAnd => "logical_and",
            Order::LogicalOr => "logical_or",
            Order::Conditional => "conditional",
            Order::Lambda => "lambda",
            Order::None => "none",
        }
    }

    const ALL: [Order; 21] = [
        Order::Atomic,
        Order::Collection,
        Order::StringConversion,
        Order::Member,
        Order::FunctionCall,
        Order::Exponentiation,
        Order::UnarySign,
        Order::BitwiseNot,
        Order::Multiplicative,
        Order::Additive,
        Order::BitwiseShift,
        Order::BitwiseAnd,
        Order::BitwiseXor,
        Order::BitwiseOr,
        Order::Relational,
        Order::LogicalNot,
        Order::LogicalAnd,
        Order::LogicalOr,
        Order::Conditional,
        Order::Lambda,
        Order::None,
    ];

    /// Whether an expression of order `self` needs parentheses when placed in a
    /// slot that expects `outer`.
    pub fn needs_parens_in(self, outer: Order) -> bool {
        let (inner_class, outer_class) = (self.class(), outer.class());
        if outer_class > inner_class {
            return false;
        }
        if outer_class == inner_class && (outer_class == 0 || outer_class == 99) {
            return false;
        }
        !ORDER_OVERRIDES.contains(&(outer, self))
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Order::ALL
            .iter()
            .copied()
            .find(|o| o.name() == s)
            .ok_or_else(|| format!("unknown precedence order: {}", s))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The code one block contributes.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeFragment {
    /// A standalone instruction, possibly spanning several lines.
    Statement { code: String },
    /// A value, tagged with the precedence of its outermost operator.
    Expression { code: String, order: Order },
}

impl CodeFragment {
    pub fn statement(code: impl Into<String>) -> Self {
        CodeFragment::Statement { code: code.into() }
    }

    pub fn expression(code: impl Into<String>, order: Order) -> Self {
        CodeFragment::Expression {
            code: code.into(),
            order,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            CodeFragment::Statement { code } => code,
            CodeFragment::Expression { code, .. } => code,
        }
    }

    pub fn order(&self) -> Option<Order> {
        match self {
            CodeFragment::Statement { .. } => Option::None,
            CodeFragment::Expression { order, .. } => Some(*order),
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self, CodeFragment::Statement { .. })
    }

    /// The expression's code as it must appear inside a slot of precedence `outer`.
    /// Returns `None` for statements, which cannot fill a value slot.
    pub fn value_code(&self, outer: Order) -> Option<String> {
        match self {
            CodeFragment::Statement { .. } => Option::None,
            CodeFragment::Expression { code, order } => {
                if order.needs_parens_in(outer) {
                    Some(format!("({})", code))
                } else {
                    Some(code.clone())
                }
            }
        }
    }
}
