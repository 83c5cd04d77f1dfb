//! Abstract Syntax Tree (AST) definitions for Kestrel scripts.
//!
//! The parser lives outside this crate; these types are the compiler's input
//! contract. Constructors on [`Statement`] and [`Expression`] keep
//! hand-built trees short.

/// A complete script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// The top-level statements
    pub body: Vec<Statement>,
}

impl Program {
    /// Creates a program from its statements.
    pub fn new(body: Vec<Statement>) -> Self {
        Self { body }
    }
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// The name of the identifier
    pub name: String,
}

impl Identifier {
    /// Creates an identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Expression evaluated for its side effects
    Expression(Expression),
    /// `:=`, `=` or compound assignment
    Assign(AssignStatement),
    /// `x++` / `x--`
    IncDec(IncDecStatement),
    /// Block statement { ... }
    Block(BlockStatement),
    /// If statement
    If(IfStatement),
    /// Three-clause for statement
    For(ForStatement),
    /// for-in statement
    ForIn(ForInStatement),
    /// Return statement
    Return(ReturnStatement),
    /// break
    Break,
    /// continue
    Continue,
    /// Empty statement (;)
    Empty,
}

/// An assignment statement.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStatement {
    /// The assignment target
    pub target: Expression,
    /// The operator
    pub operator: AssignOperator,
    /// The right-hand side
    pub value: Expression,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOperator {
    /// :=
    Define,
    /// =
    Assign,
    /// +=
    Add,
    /// -=
    Subtract,
    /// *=
    Multiply,
    /// /=
    Divide,
    /// %=
    Modulo,
    /// &=
    BitwiseAnd,
    /// |=
    BitwiseOr,
    /// ^=
    BitwiseXor,
    /// &^=
    BitwiseAndNot,
    /// <<=
    LeftShift,
    /// >>=
    RightShift,
}

/// An increment or decrement statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IncDecStatement {
    /// The operand
    pub target: Expression,
    /// The operator
    pub operator: UpdateOperator,
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// ++
    Increment,
    /// --
    Decrement,
}

/// A block statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    /// The statements in the block
    pub body: Vec<Statement>,
}

impl BlockStatement {
    /// Creates a block from its statements.
    pub fn new(body: Vec<Statement>) -> Self {
        Self { body }
    }
}

/// An if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// Optional init statement, scoped to the whole if/else chain
    pub init: Option<Box<Statement>>,
    /// The condition
    pub test: Expression,
    /// The then branch
    pub consequent: BlockStatement,
    /// The optional else branch, a block or another if statement
    pub alternate: Option<Box<Statement>>,
}

/// A three-clause for statement. Every clause is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    /// Initializer
    pub init: Option<Box<Statement>>,
    /// Condition
    pub test: Option<Expression>,
    /// Post statement, run after every iteration
    pub update: Option<Box<Statement>>,
    /// Loop body
    pub body: BlockStatement,
}

/// A for-in statement: `for key, value in iterable { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatement {
    /// Key binding; `None` when omitted or `_`
    pub key: Option<Identifier>,
    /// Value binding; `None` when omitted or `_`
    pub value: Option<Identifier>,
    /// The collection being iterated
    pub iterable: Expression,
    /// Loop body
    pub body: BlockStatement,
}

/// A return statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    /// The returned value, if any
    pub argument: Option<Expression>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Identifier reference
    Identifier(Identifier),
    /// Array literal
    Array(ArrayExpression),
    /// Map literal
    Map(MapExpression),
    /// Binary expression
    Binary(BinaryExpression),
    /// Unary expression
    Unary(UnaryExpression),
    /// Conditional (ternary) expression
    Conditional(ConditionalExpression),
    /// Index expression `x[i]`
    Index(IndexExpression),
    /// Selector expression `x.name`
    Selector(SelectorExpression),
    /// Slice expression `x[lo:hi]`
    Slice(SliceExpression),
    /// Call expression
    Call(CallExpression),
    /// Function literal
    Function(FunctionLiteral),
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
    /// Char literal
    Char(char),
    /// Boolean literal
    Bool(bool),
    /// undefined literal
    Undefined,
}

/// An array literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpression {
    /// The elements
    pub elements: Vec<Expression>,
}

/// A map literal.
#[derive(Debug, Clone, PartialEq)]
pub struct MapExpression {
    /// The entries, in source order
    pub elements: Vec<MapElement>,
}

/// A map literal entry. Identifier and string keys both arrive as strings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapElement {
    /// The key
    pub key: String,
    /// The value
    pub value: Expression,
}

/// A binary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    /// The operator
    pub operator: BinaryOperator,
    /// The left operand
    pub left: Box<Expression>,
    /// The right operand
    pub right: Box<Expression>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// %
    Modulo,
    // Bitwise
    /// &
    BitwiseAnd,
    /// |
    BitwiseOr,
    /// ^
    BitwiseXor,
    /// &^
    BitwiseAndNot,
    /// <<
    LeftShift,
    /// >>
    RightShift,
    // Comparison
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// <
    LessThan,
    /// <=
    LessThanEqual,
    /// >
    GreaterThan,
    /// >=
    GreaterThanEqual,
    // Logical
    /// &&
    LogicalAnd,
    /// ||
    LogicalOr,
}

/// A unary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    /// The operator
    pub operator: UnaryOperator,
    /// The operand
    pub argument: Box<Expression>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// -
    Minus,
    /// +
    Plus,
    /// !
    LogicalNot,
    /// ^
    BitwiseNot,
}

/// A conditional (ternary) expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    /// The condition
    pub test: Box<Expression>,
    /// The consequent (if true)
    pub consequent: Box<Expression>,
    /// The alternate (if false)
    pub alternate: Box<Expression>,
}

/// An index expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    /// The indexed value
    pub object: Box<Expression>,
    /// The index
    pub index: Box<Expression>,
}

/// A selector expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorExpression {
    /// The selected-from value
    pub object: Box<Expression>,
    /// The selected field
    pub property: Identifier,
}

/// A slice expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpression {
    /// The sliced value
    pub object: Box<Expression>,
    /// Low bound, start of the value if omitted
    pub low: Option<Box<Expression>>,
    /// High bound, end of the value if omitted
    pub high: Option<Box<Expression>>,
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// The function being called
    pub callee: Box<Expression>,
    /// The arguments
    pub arguments: Vec<Expression>,
}

/// A function literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    /// Parameters
    pub params: Vec<Identifier>,
    /// Body
    pub body: BlockStatement,
}

impl Statement {
    /// `expr` as a statement.
    pub fn expression(expr: Expression) -> Self {
        Statement::Expression(expr)
    }

    /// `name := value`
    pub fn define(name: impl Into<String>, value: Expression) -> Self {
        Self::assign_op(Expression::ident(name), AssignOperator::Define, value)
    }

    /// `target = value`
    pub fn assign(target: Expression, value: Expression) -> Self {
        Self::assign_op(target, AssignOperator::Assign, value)
    }

    /// `target <op> value` for any assignment operator.
    pub fn assign_op(target: Expression, operator: AssignOperator, value: Expression) -> Self {
        Statement::Assign(AssignStatement {
            target,
            operator,
            value,
        })
    }

    /// `target++`
    pub fn increment(target: Expression) -> Self {
        Statement::IncDec(IncDecStatement {
            target,
            operator: UpdateOperator::Increment,
        })
    }

    /// `target--`
    pub fn decrement(target: Expression) -> Self {
        Statement::IncDec(IncDecStatement {
            target,
            operator: UpdateOperator::Decrement,
        })
    }

    /// `{ body }`
    pub fn block(body: Vec<Statement>) -> Self {
        Statement::Block(BlockStatement::new(body))
    }

    /// `return value`
    pub fn return_value(value: Expression) -> Self {
        Statement::Return(ReturnStatement {
            argument: Some(value),
        })
    }

    /// Bare `return`
    pub fn return_nothing() -> Self {
        Statement::Return(ReturnStatement { argument: None })
    }

    /// `if test { consequent } else alternate`
    pub fn if_else(
        test: Expression,
        consequent: Vec<Statement>,
        alternate: Option<Statement>,
    ) -> Self {
        Statement::If(IfStatement {
            init: None,
            test,
            consequent: BlockStatement::new(consequent),
            alternate: alternate.map(Box::new),
        })
    }

    /// `for init; test; update { body }`
    pub fn for_loop(
        init: Option<Statement>,
        test: Option<Expression>,
        update: Option<Statement>,
        body: Vec<Statement>,
    ) -> Self {
        Statement::For(ForStatement {
            init: init.map(Box::new),
            test,
            update: update.map(Box::new),
            body: BlockStatement::new(body),
        })
    }

    /// `for key, value in iterable { body }`. A `_` binding is skipped.
    pub fn for_in(
        key: Option<&str>,
        value: Option<&str>,
        iterable: Expression,
        body: Vec<Statement>,
    ) -> Self {
        let binding = |name: Option<&str>| name.filter(|n| *n != "_").map(Identifier::new);
        Statement::ForIn(ForInStatement {
            key: binding(key),
            value: binding(value),
            iterable,
            body: BlockStatement::new(body),
        })
    }
}

impl Expression {
    /// Identifier reference.
    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier::new(name))
    }

    /// Integer literal.
    pub fn int(value: i64) -> Self {
        Expression::Literal(Literal::Int(value))
    }

    /// Float literal.
    pub fn float(value: f64) -> Self {
        Expression::Literal(Literal::Float(value))
    }

    /// String literal.
    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    /// Char literal.
    pub fn char(value: char) -> Self {
        Expression::Literal(Literal::Char(value))
    }

    /// Boolean literal.
    pub fn bool(value: bool) -> Self {
        Expression::Literal(Literal::Bool(value))
    }

    /// undefined literal.
    pub fn undefined() -> Self {
        Expression::Literal(Literal::Undefined)
    }

    /// Array literal.
    pub fn array(elements: Vec<Expression>) -> Self {
        Expression::Array(ArrayExpression { elements })
    }

    /// Map literal.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expression)>) -> Self {
        Expression::Map(MapExpression {
            elements: entries
                .into_iter()
                .map(|(key, value)| MapElement {
                    key: key.into(),
                    value,
                })
                .collect(),
        })
    }

    /// Binary expression.
    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Unary expression.
    pub fn unary(operator: UnaryOperator, argument: Expression) -> Self {
        Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
        })
    }

    /// `test ? consequent : alternate`
    pub fn conditional(test: Expression, consequent: Expression, alternate: Expression) -> Self {
        Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// `object[index]`
    pub fn index(object: Expression, index: Expression) -> Self {
        Expression::Index(IndexExpression {
            object: Box::new(object),
            index: Box::new(index),
        })
    }

    /// `object.property`
    pub fn selector(object: Expression, property: impl Into<String>) -> Self {
        Expression::Selector(SelectorExpression {
            object: Box::new(object),
            property: Identifier::new(property),
        })
    }

    /// `object[low:high]`
    pub fn slice(object: Expression, low: Option<Expression>, high: Option<Expression>) -> Self {
        Expression::Slice(SliceExpression {
            object: Box::new(object),
            low: low.map(Box::new),
            high: high.map(Box::new),
        })
    }

    /// `callee(arguments...)`
    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        Expression::Call(CallExpression {
            callee: Box::new(callee),
            arguments,
        })
    }

    /// `func(params...) { body }`
    pub fn function(params: &[&str], body: Vec<Statement>) -> Self {
        Expression::Function(FunctionLiteral {
            params: params.iter().map(|p| Identifier::new(*p)).collect(),
            body: BlockStatement::new(body),
        })
    }
}
