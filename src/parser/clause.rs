use crate::parser::ast::JoinType;

/// Section of the statement that follows the main FROM keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clause {
    #[default]
    From,
    InnerJoin,
    LeftJoin,
    RightJoin,
    Where,
    GroupBy,
    OrderBy,
    Limit,
    Offset,
}

impl Clause {
    pub fn join_type(&self) -> Option<JoinType> {
        match self {
            Clause::InnerJoin => Some(JoinType::Inner),
            Clause::LeftJoin => Some(JoinType::Left),
            Clause::RightJoin => Some(JoinType::Right),
            _ => None,
        }
    }
}

/// Text of one clause, keyword excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseSegment {
    pub clause: Clause,
    pub text: String,
}
