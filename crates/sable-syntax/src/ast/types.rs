//! Type annotation AST nodes

use super::*;
use crate::span::Span;
use std::fmt;

/// Type annotation: int, List<String>, prefix.Type<T>
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub id: NodeId,
    /// Library prefix for `prefix.Type`
    pub prefix: Option<Identifier>,
    pub name: Identifier,
    pub args: Vec<TypeNode>,
    pub span: Span,
}

impl TypeNode {
    pub fn is_void(&self) -> bool {
        self.prefix.is_none() && self.name.name == "void"
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{}.", prefix.name)?;
        }
        write!(f, "{}", self.name.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Type parameter declaration: T, T extends Comparable<T>
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    pub id: NodeId,
    pub name: Identifier,
    pub bound: Option<TypeNode>,
    pub span: Span,
}

impl fmt::Display for TypeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bound {
            Some(bound) => write!(f, "{} extends {}", self.name.name, bound),
            None => write!(f, "{}", self.name.name),
        }
    }
}

/// Render a type parameter list the way it is written in source
pub fn type_parameters_text(params: &[TypeParameter]) -> String {
    let parts: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("<{}>", parts.join(", "))
}
