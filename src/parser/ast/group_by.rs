use crate::parser::QueryParser;

pub struct GroupByParser;

impl GroupByParser {
    pub fn parse(text: &str) -> Vec<String> {
        QueryParser::split_top_level(text, ',')
    }
}
