//! Semantic diagnostics.
//!
//! One variant per rule violation; the `#[error]` strings are the exact
//! messages differential tests compare against, so they must not change.

use thiserror::Error;

/// A fatal semantic error. The first one aborts the compilation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SemanticError {
    // -- class table ------------------------------------------------------
    #[error("Redefinition of basic class {0}.")]
    BasicClassRedefined(String),

    #[error("Class {0} was previously defined.")]
    ClassRedefined(String),

    #[error("Class {class} cannot inherit class {parent}.")]
    IllegalParent { class: String, parent: String },

    #[error("Class {class} inherits from an undefined class {parent}.")]
    UndefinedParent { class: String, parent: String },

    #[error("Class {0}, or an ancestor of {0}, is involved in an inheritance cycle.")]
    InheritanceCycle(String),

    // -- program entry ----------------------------------------------------
    #[error("Class Main is not defined.")]
    MainNotDefined,

    #[error("No 'main' method in class Main.")]
    NoMainMethod,

    #[error("'main' method in class Main should have no arguments")]
    MainHasArguments,

    // -- method definitions -----------------------------------------------
    #[error("'self' cannot be the name of a formal parameter.")]
    SelfFormal,

    #[error("Class {ty} of formal parameter {formal} is undefined.")]
    UndefinedFormalType { ty: String, formal: String },

    #[error("Undefined return type {ty} in method {method}.")]
    UndefinedReturnType { ty: String, method: String },

    #[error("Incompatible number of formal parameters in redefined method {0}.")]
    RedefinedMethodArity(String),

    #[error("In redefined method {method}, parameter type {actual} is different from original type {original}.")]
    RedefinedMethodParam {
        method: String,
        actual: String,
        original: String,
    },

    #[error("In redefined method {method}, return type {actual} is different from original return type {original}.")]
    RedefinedMethodReturn {
        method: String,
        actual: String,
        original: String,
    },

    #[error("Formal parameter {0} cannot have type SELF_TYPE.")]
    SelfTypeFormal(String),

    #[error("Formal parameter {0} is multiply defined.")]
    FormalRedefined(String),

    #[error("Inferred return type {actual} of method {method} does not conform to declared return type {declared}.")]
    MethodBodyMismatch {
        method: String,
        actual: String,
        declared: String,
    },

    // -- attributes -------------------------------------------------------
    #[error("'self' cannot be the name of an attribute.")]
    SelfAttribute,

    #[error("Attribute {0} is multiply defined in class.")]
    AttributeRedefined(String),

    #[error("Attribute {0} is an attribute of an inherited class.")]
    InheritedAttributeRedefined(String),

    #[error("Class {ty} of attribute {attr} is undefined.")]
    UndefinedAttributeType { ty: String, attr: String },

    #[error("Inferred type {actual} of attribute {attr} does not conform to declared type {declared}.")]
    AttributeInitMismatch {
        attr: String,
        actual: String,
        declared: String,
    },

    // -- expressions ------------------------------------------------------
    #[error("Cannot assign to 'self'.")]
    AssignToSelf,

    #[error("Assignment to undeclared variable {0}.")]
    AssignUndeclared(String),

    #[error("Type {actual} of assigned expression does not conform to declared type {declared} of identifier {id}.")]
    AssignMismatch {
        id: String,
        actual: String,
        declared: String,
    },

    #[error("Undeclared identifier {0}.")]
    UndeclaredIdentifier(String),

    #[error("Dispatch on undefined class {0}.")]
    DispatchOnUndefined(String),

    #[error("Dispatch to undefined method {0}.")]
    DispatchToUndefined(String),

    #[error("Static dispatch to undefined method {0}.")]
    StaticDispatchToUndefined(String),

    #[error("Expression type {actual} does not conform to declared static dispatch type {declared}.")]
    StaticDispatchMismatch { actual: String, declared: String },

    #[error("Method {0} called with wrong number of arguments.")]
    DispatchArity(String),

    #[error("In call of method {method}, type {actual} of parameter {param} does not conform to declared type {declared}.")]
    DispatchArgMismatch {
        method: String,
        param: String,
        actual: String,
        declared: String,
    },

    #[error("Predicate of 'if' does not have type Bool.")]
    IfPredicateNotBool,

    #[error("Loop condition does not have type Bool.")]
    LoopConditionNotBool,

    #[error("'self' cannot be bound in a 'let' expression.")]
    LetBindsSelf,

    #[error("Class {ty} of let-bound identifier {id} is undefined.")]
    UndefinedLetType { ty: String, id: String },

    #[error("Inferred type {actual} of initialization of {id} does not conform to identifier's declared type {declared}.")]
    LetInitMismatch {
        id: String,
        actual: String,
        declared: String,
    },

    #[error("Duplicate branch {0} in case statement.")]
    DuplicateCaseBranch(String),

    #[error("Class {ty} of case branch {id} is undefined.")]
    UndefinedBranchType { ty: String, id: String },

    #[error("'new' used with undefined class {0}.")]
    NewUndefined(String),

    #[error("non-Int arguments: {lhs} {op} {rhs}")]
    NonIntArguments {
        lhs: String,
        op: &'static str,
        rhs: String,
    },

    #[error("Argument of '~' has type {0} instead of Int.")]
    NegNotInt(String),

    #[error("Argument of 'not' has type {0} instead of Bool.")]
    NotNotBool(String),

    #[error("Illegal comparison with a basic type.")]
    IllegalComparison,
}
