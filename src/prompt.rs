// src/prompt.rs
//! Builds the few-shot completion prompt from a table schema, the running
//! transcript, and the newest user description.

use crate::dataset::Table;
use crate::session::Transcript;
use thiserror::Error;

/// Curated example for the built-in Gapminder sample. The prompt quotes
/// this verbatim so the model sees a known-good call for known columns.
pub const SAMPLE_EXAMPLE_DESCRIPTION: &str =
    "The life expectancy in Oceania countries throughout the years.";
pub const SAMPLE_EXAMPLE_CODE: &str =
    "px.line(df.query(\"continent == 'Oceania'\"), x='year', y='lifeExp', color='country', log_y=False, log_x=False)";

#[derive(Error, Debug, PartialEq)]
pub enum PromptError {
    #[error("table needs at least two columns to chart, found {0}")]
    TooFewColumns(usize),
}

/// Build the schema-plus-example section of the prompt.
///
/// The sample dataset gets the hand-authored Oceania example; any uploaded
/// table gets a generic example wired to its first two column names. Tables
/// with fewer than two columns are rejected here rather than producing an
/// example that references columns that do not exist.
pub fn build_prompt(table: &Table) -> Result<String, PromptError> {
    if table.columns.len() < 2 {
        return Err(PromptError::TooFewColumns(table.columns.len()));
    }

    if table.is_sample() {
        return Ok(format!(
            "Our dataframe \"df\" columns contain: country, continent, year, \
life expectancy (lifeExp), population (pop), GDP per capita (gdpPercap), \
the ISO alpha, the ISO numerical.\n\
\n\
Description: {}\n\
\n\
Code: {}\n",
            SAMPLE_EXAMPLE_DESCRIPTION, SAMPLE_EXAMPLE_CODE
        ));
    }

    let columns = table.columns.join(", ");
    let first = &table.columns[0];
    let second = &table.columns[1];
    Ok(format!(
        "Our dataframe \"df\" columns contain: {columns}.\n\
Use the plotly express library to generate a graph.\n\
Only provide one px function call, with no markdown fences. \
One line of code is enough.\n\
\n\
Description: Number of {first} by {second}\n\
\n\
Code: px.histogram(df, x=\"{second}\")\n"
    ))
}

/// Concatenate the schema prompt, the running transcript, and the newest
/// description, ending with an open `Code:` marker for the model to finish.
pub fn compose_request(prompt: &str, transcript: &Transcript, description: &str) -> String {
    format!(
        "{}{}\nDescription: {}\n\nCode:",
        prompt,
        transcript.render(),
        description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{sample_table, Cell, Table};

    fn uploaded_table(columns: &[&str]) -> Table {
        Table {
            name: "uploaded".to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: vec![vec![Cell::Empty; columns.len()]],
        }
    }

    #[test]
    fn test_sample_prompt_contains_curated_example_verbatim() {
        let prompt = build_prompt(&sample_table()).unwrap();
        assert!(prompt.contains(SAMPLE_EXAMPLE_CODE));
        assert!(prompt.contains(SAMPLE_EXAMPLE_DESCRIPTION));
    }

    #[test]
    fn test_generic_prompt_references_first_two_columns() {
        let table = uploaded_table(&["region", "sales", "margin"]);
        let prompt = build_prompt(&table).unwrap();
        assert!(prompt.contains("region, sales, margin"));
        assert!(prompt.contains("Number of region by sales"));
        assert!(prompt.contains("px.histogram(df, x=\"sales\")"));
    }

    #[test]
    fn test_too_few_columns_is_rejected() {
        let table = uploaded_table(&["only"]);
        assert_eq!(build_prompt(&table), Err(PromptError::TooFewColumns(1)));
    }

    #[test]
    fn test_compose_request_ends_with_open_code_marker() {
        let prompt = build_prompt(&sample_table()).unwrap();
        let mut transcript = Transcript::default();
        transcript.push("first ask".to_string(), "px.line(df, x='year', y='pop')".to_string());

        let request = compose_request(&prompt, &transcript, "life expectancy trend");
        assert!(request.ends_with("Code:"));
        assert!(request.contains("Description: life expectancy trend"));
        // Prior exchange precedes the new description.
        let prior = request.find("first ask").unwrap();
        let newest = request.find("life expectancy trend").unwrap();
        assert!(prior < newest);
    }
}
