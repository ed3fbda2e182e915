use crate::parser::{Clause, WordComparer};

#[derive(Debug, Clone)]
pub struct QueryComparers {
    pub select: WordComparer,
    pub distinct: WordComparer,
    pub alias: WordComparer,
    pub from: WordComparer,
    pub inner_join: WordComparer,
    pub left_join: WordComparer,
    pub right_join: WordComparer,
    pub on: WordComparer,
    pub max: WordComparer,
    pub r#where: WordComparer,
    pub group_by: WordComparer,
    pub order_by: WordComparer,
    pub limit: WordComparer,
    pub offset: WordComparer,
}

impl Default for QueryComparers {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryComparers {
    pub fn new() -> Self {
        Self {
            select: WordComparer::new("SELECT"),
            distinct: WordComparer::new("DISTINCT"),
            alias: WordComparer::new("AS"),
            from: WordComparer::new("FROM"),
            inner_join: WordComparer::new("INNER JOIN"),
            left_join: WordComparer::new("LEFT JOIN"),
            right_join: WordComparer::new("RIGHT JOIN"),
            on: WordComparer::new("ON"),
            max: WordComparer::new("MAX"),
            r#where: WordComparer::new("WHERE"),
            group_by: WordComparer::new("GROUP BY"),
            order_by: WordComparer::new("ORDER BY"),
            limit: WordComparer::new("LIMIT"),
            offset: WordComparer::new("OFFSET"),
        }
    }

    /// Clause delimiters in the order they are tried.
    pub fn clauses(&self) -> Vec<(Clause, &WordComparer)> {
        vec![
            (Clause::InnerJoin, &self.inner_join),
            (Clause::LeftJoin, &self.left_join),
            (Clause::RightJoin, &self.right_join),
            (Clause::Where, &self.r#where),
            (Clause::GroupBy, &self.group_by),
            (Clause::OrderBy, &self.order_by),
            (Clause::Limit, &self.limit),
            (Clause::Offset, &self.offset),
        ]
    }
}
