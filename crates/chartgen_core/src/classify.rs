//! Local query classification: decide whether a free-text request is
//! actionable and, if so, which of the seven chart types it asks for.
//!
//! The cascade is ordered: edge cases first (vague, too short, numeric-only,
//! question-without-intent, gibberish, greeting), then explicit chart-type
//! keywords, then column-aware suggestions for anything left over. The first
//! stage that matches wins.

use crate::table::Table;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    BarChart,
    LineChart,
    ScatterPlot,
    PieChart,
    Histogram,
    BoxPlot,
    Heatmap,
}

impl ChartType {
    /// Canonical wire id, e.g. `bar_chart`.
    pub fn wire_name(self) -> &'static str {
        match self {
            ChartType::BarChart => "bar_chart",
            ChartType::LineChart => "line_chart",
            ChartType::ScatterPlot => "scatter_plot",
            ChartType::PieChart => "pie_chart",
            ChartType::Histogram => "histogram",
            ChartType::BoxPlot => "box_plot",
            ChartType::Heatmap => "heatmap",
        }
    }

    /// Lowercase human name, e.g. "bar chart".
    pub fn display_name(self) -> &'static str {
        match self {
            ChartType::BarChart => "bar chart",
            ChartType::LineChart => "line chart",
            ChartType::ScatterPlot => "scatter plot",
            ChartType::PieChart => "pie chart",
            ChartType::Histogram => "histogram",
            ChartType::BoxPlot => "box plot",
            ChartType::Heatmap => "heatmap",
        }
    }

    /// Lenient parse for identifiers coming back from the remote
    /// classifier ("bar", "bar chart", "bar_chart", ...).
    pub fn from_loose(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        // Ordered so that e.g. "scatter" is tested before the bare "pie"
        // substring cannot shadow it; each key is unambiguous.
        const MAP: &[(&str, ChartType)] = &[
            ("bar", ChartType::BarChart),
            ("line", ChartType::LineChart),
            ("scatter", ChartType::ScatterPlot),
            ("pie", ChartType::PieChart),
            ("histogram", ChartType::Histogram),
            ("box", ChartType::BoxPlot),
            ("heatmap", ChartType::Heatmap),
        ];
        MAP.iter()
            .find(|(key, _)| lower.contains(key))
            .map(|(_, ct)| *ct)
    }
}

/// Outcome of classification. Non-actionable queries carry guidance instead
/// of a chart type; there is deliberately no placeholder default here.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Actionable { chart_type: ChartType },
    Clarify { message: String, suggestions: Vec<String> },
}

impl Classification {
    fn clarify(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Classification::Clarify { message: message.into(), suggestions }
    }
}

/// Explicit chart-type keyword groups, tested in declared order with
/// case-insensitive substring matching. "correlation" lives in the scatter
/// group, so correlation queries resolve to scatter deterministically.
/// "correlation matrix" also hits the scatter group first; "heatmap" and
/// "heat map" are the reliable heatmap triggers.
const KEYWORD_GROUPS: &[(&[&str], ChartType)] = &[
    (&["bar", "column", "bars", "columns"], ChartType::BarChart),
    (&["line", "trend", "trends", "time series", "over time"], ChartType::LineChart),
    (&["scatter", "scatterplot", "scatter plot", "correlation"], ChartType::ScatterPlot),
    (&["pie", "pie chart", "donut", "circle"], ChartType::PieChart),
    (&["histogram", "distribution", "freq", "frequency"], ChartType::Histogram),
    (&["box", "box plot", "boxplot", "quartile"], ChartType::BoxPlot),
    (&["heatmap", "heat map", "correlation matrix"], ChartType::Heatmap),
];

const VAGUE_PATTERNS: &[&str] = &[
    "any graph", "any chart", "any plot", "some graph", "some chart",
    "generate graph", "create graph", "make graph", "show graph",
    "visualize", "plot data", "chart data", "graph data",
    "something", "anything", "whatever", "just show me", "display",
];

const QUESTION_WORDS: &[&str] = &["what", "how", "why", "when", "where", "who"];

const CHART_INTENT_WORDS: &[&str] = &["chart", "graph", "plot", "show", "visualize"];

const GREETING_PATTERNS: &[&str] = &[
    "hello", "hi", "hey", "good morning", "good afternoon", "good evening",
    "thanks", "thank you",
];

/// Classify a query against the table using local heuristics only.
pub fn classify(query: &str, table: &Table) -> Classification {
    let query_lower = query.to_lowercase().trim().to_string();

    if let Some(result) = detect_edge_case(&query_lower, table) {
        return result;
    }

    if let Some(chart_type) = detect_chart_keyword(&query_lower) {
        return Classification::Actionable { chart_type };
    }

    Classification::clarify(
        format!("I'm not sure what '{query}' means. Could you try one of these instead?"),
        suggest_charts(table, 3),
    )
}

/// First matching keyword group wins; groups are in declared order.
pub fn detect_chart_keyword(query_lower: &str) -> Option<ChartType> {
    KEYWORD_GROUPS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| query_lower.contains(k)))
        .map(|(_, chart_type)| *chart_type)
}

/// Column-aware suggestion synthesis, capped at `cap` entries, with generic
/// fallbacks when the table has no suitable columns.
pub fn suggest_charts(table: &Table, cap: usize) -> Vec<String> {
    let numeric = table.numeric_column_names();
    let categorical = table.categorical_column_names();

    let mut suggestions = vec![];
    if !categorical.is_empty() && !numeric.is_empty() {
        suggestions.push(format!("Show me a bar chart of {} by {}", numeric[0], categorical[0]));
        suggestions.push(format!("Create a pie chart showing {} distribution", categorical[0]));
    }
    if numeric.len() >= 2 {
        suggestions.push(format!("Make a scatter plot of {} vs {}", numeric[0], numeric[1]));
        suggestions.push(format!("Create a line chart showing {} trends", numeric[0]));
    }
    if !numeric.is_empty() {
        suggestions.push(format!("Show a histogram of {} distribution", numeric[0]));
    }

    suggestions.truncate(cap);
    if suggestions.is_empty() {
        suggestions = vec![
            "Please be more specific about what you'd like to visualize".into(),
            "Try: 'Show me a bar chart of sales by region'".into(),
            "Or: 'Create a line chart showing trends over time'".into(),
        ];
        suggestions.truncate(cap);
    }
    suggestions
}

fn detect_edge_case(query_lower: &str, table: &Table) -> Option<Classification> {
    let numeric = table.numeric_column_names();
    let categorical = table.categorical_column_names();

    // 1. Vague requests: the user wants "a graph" but names nothing.
    if VAGUE_PATTERNS.iter().any(|p| query_lower.contains(p)) {
        return Some(Classification::clarify(
            "I'd be happy to help! Since you want 'any graph', here are some great options based on your data:",
            suggest_charts(table, 4),
        ));
    }

    // 2. Too short to mean anything.
    if query_lower.chars().count() <= 2 {
        return Some(Classification::clarify(
            "Your query seems too short. Please tell me what kind of graph you'd like to see!",
            vec![
                "Try: 'Show me a bar chart comparing values'".into(),
                "Or: 'Create a line chart showing trends'".into(),
                "Be specific: 'Make a pie chart of categories'".into(),
            ],
        ));
    }

    // 3. Numbers or punctuation only.
    let no_spaces: String = query_lower.chars().filter(|c| !c.is_whitespace()).collect();
    if (!no_spaces.is_empty() && no_spaces.chars().all(|c| c.is_ascii_digit()))
        || !query_lower.chars().any(|c| c.is_alphabetic())
    {
        let target = numeric.first().map(String::as_str).unwrap_or("values");
        return Some(Classification::clarify(
            "I need a text description of what you want to visualize. Numbers alone won't help me understand!",
            vec![
                format!("Try: 'Show {target} in a bar chart'"),
                "Describe what you want to see, like 'compare sales by region'".into(),
                "Use words to tell me about your visualization goal".into(),
            ],
        ));
    }

    // 4. Questions with no visualization intent.
    if QUESTION_WORDS.iter().any(|q| query_lower.starts_with(q))
        && !CHART_INTENT_WORDS.iter().any(|w| query_lower.contains(w))
    {
        let head: String = query_lower.chars().take(30).collect();
        return Some(Classification::clarify(
            "I can help you visualize data! Try rephrasing your question to specify what kind of chart you'd like.",
            vec![
                format!("Instead of '{head}...', try: 'Show me a bar chart of...'"),
                "Add words like 'chart', 'graph', or 'plot' to your request".into(),
                "Be specific about the visualization type you want".into(),
            ],
        ));
    }

    // 5. Gibberish: long but nearly alphabet-free, or no real word at all.
    let distinct: std::collections::HashSet<char> =
        query_lower.chars().filter(|c| !c.is_whitespace()).collect();
    let has_real_word = query_lower
        .split_whitespace()
        .any(|w| w.chars().count() > 2 && w.chars().all(|c| c.is_alphabetic()));
    if (distinct.len() < 4 && query_lower.chars().count() > 10) || !has_real_word {
        return Some(Classification::clarify(
            "I couldn't understand your request. Please use clear words to describe what you want to visualize!",
            vec![
                "Use simple English like 'show me a bar chart'".into(),
                "Describe your data visualization goal clearly".into(),
                "Try: 'Create a graph showing...' followed by what you want to see".into(),
            ],
        ));
    }

    // 6. Greetings and small talk. Substring match: "hi" also hits inside
    // "histogram", so a bare ≤3-word "histogram please" greets back.
    if query_lower.split_whitespace().count() <= 3
        && GREETING_PATTERNS.iter().any(|g| query_lower.contains(g))
    {
        let first = if !numeric.is_empty() && !categorical.is_empty() {
            format!("Try: 'Show me a bar chart of {} by {}'", numeric[0], categorical[0])
        } else {
            "Try: 'Show me a bar chart'".into()
        };
        return Some(Classification::clarify(
            "Hello! I'm here to help you create graphs. What would you like to visualize?",
            vec![
                first,
                "Or: 'Create a line chart showing trends over time'".into(),
                "Be specific about what data you want to see in graph form".into(),
            ],
        ));
    }

    None
}
