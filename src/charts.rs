// 📈 Chart-Data Builder - summary series from the in-memory tables
//
// Recomputes the report statistics without the store. A series whose
// source column is absent is skipped, not an error.

use crate::buckets::AgeBucket;
use crate::queries::TOP_MCC_LIMIT;
use crate::table::{Table, TableRole, Value};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// SERIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    /// Proportion-style presentation
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// File stem for the rendered chart
    pub name: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<SeriesPoint>,
}

impl ChartSeries {
    fn new(name: &str, title: &str, kind: ChartKind, x_label: &str, y_label: &str) -> Self {
        ChartSeries {
            name: name.to_string(),
            title: title.to_string(),
            kind,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points: Vec::new(),
        }
    }

    fn with_counts(mut self, counts: Vec<(String, usize)>) -> Self {
        self.points = counts
            .into_iter()
            .map(|(label, count)| SeriesPoint {
                label,
                value: count as f64,
            })
            .collect();
        self
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Value for one label, if the series has it.
    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.points.iter().find(|p| p.label == label).map(|p| p.value)
    }
}

/// Every series that could be derived, in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn get(&self, name: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

// ============================================================================
// CARD LOOKUP
// ============================================================================

/// Outcome of resolving a transaction's `card_id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Matched(&'a Value),
    Unmatched,
}

/// `cards.id` → `cards.card_brand`, built once per run.
pub struct CardBrandLookup<'a> {
    brands: HashMap<String, &'a Value>,
}

impl<'a> CardBrandLookup<'a> {
    /// None when the cards table lacks `id` or `card_brand`.
    pub fn build(cards: &'a Table) -> Option<Self> {
        let id_idx = cards.column_index("id")?;
        let brand_idx = cards.column_index("card_brand")?;

        let mut brands = HashMap::with_capacity(cards.row_count());
        let mut duplicates = 0;
        for row in &cards.rows {
            let Some(key) = row[id_idx].join_key() else {
                continue;
            };
            if brands.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            brands.insert(key, &row[brand_idx]);
        }
        if duplicates > 0 {
            warn!("cards: {} duplicate ids, keeping the first of each", duplicates);
        }

        Some(CardBrandLookup { brands })
    }

    pub fn brand_of(&self, card_id: &Value) -> Lookup<'a> {
        match card_id.join_key().and_then(|k| self.brands.get(&k).copied()) {
            Some(brand) => Lookup::Matched(brand),
            None => Lookup::Unmatched,
        }
    }

    pub fn len(&self) -> usize {
        self.brands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }
}

// ============================================================================
// DERIVATIONS
// ============================================================================

/// Frequency of each non-missing value, most frequent first, ties by label.
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in values.into_iter().filter_map(Value::label) {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Source column of a series, checked against the role's canonical schema.
fn source_column<'t>(
    table: &'t Table,
    role: TableRole,
    column: &str,
) -> Option<impl Iterator<Item = &'t Value>> {
    debug_assert!(role.canonical_columns().contains(&column));
    let values = table.column_values(column);
    if values.is_none() {
        debug!("{}.{} absent, skipping series", role, column);
    }
    values
}

pub fn gender_series(users: &Table) -> Option<ChartSeries> {
    let values = source_column(users, TableRole::Users, "gender")?;
    Some(
        ChartSeries::new(
            "gender_distribution",
            "Gender distribution of users",
            ChartKind::Bar,
            "gender",
            "Number of users",
        )
        .with_counts(value_counts(values)),
    )
}

pub fn card_type_series(cards: &Table) -> Option<ChartSeries> {
    let values = source_column(cards, TableRole::Cards, "card_type")?;
    Some(
        ChartSeries::new(
            "card_type_distribution",
            "Card type distribution",
            ChartKind::Pie,
            "card_type",
            "Share of cards",
        )
        .with_counts(value_counts(values)),
    )
}

pub fn card_brand_series(cards: &Table) -> Option<ChartSeries> {
    let values = source_column(cards, TableRole::Cards, "card_brand")?;
    Some(
        ChartSeries::new(
            "card_brand_distribution",
            "Card brand distribution",
            ChartKind::Bar,
            "Card brand",
            "Number of cards",
        )
        .with_counts(value_counts(values)),
    )
}

/// Age-bucket counts ascending by label; empty buckets are left out,
/// matching the grouped SQL report.
pub fn age_series(users: &Table) -> Option<ChartSeries> {
    let values = source_column(users, TableRole::Users, "current_age")?;

    // Keyed by label so the order matches `ORDER BY age_bucket`
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for age in values {
        *counts.entry(AgeBucket::for_age(age.as_f64()).label()).or_insert(0) += 1;
    }

    Some(
        ChartSeries::new(
            "age_distribution",
            "Age distribution of users",
            ChartKind::Bar,
            "Age bracket",
            "Number of users",
        )
        .with_counts(
            counts
                .into_iter()
                .map(|(label, count)| (label.to_string(), count))
                .collect(),
        ),
    )
}

pub fn transaction_method_series(transactions: &Table) -> Option<ChartSeries> {
    let values = source_column(transactions, TableRole::Transactions, "use_chip")?;
    Some(
        ChartSeries::new(
            "transaction_method_distribution",
            "Transaction method distribution",
            ChartKind::Bar,
            "method",
            "Number of transactions",
        )
        .with_counts(value_counts(values)),
    )
}

/// The most frequent MCCs, treated as text labels.
pub fn top_mcc_series(transactions: &Table) -> Option<ChartSeries> {
    let values = source_column(transactions, TableRole::Transactions, "mcc")?;
    let mut counts = value_counts(values);
    counts.truncate(TOP_MCC_LIMIT);

    Some(
        ChartSeries::new(
            "top_mcc_frequency",
            "Top merchant categories by frequency",
            ChartKind::Bar,
            "MCC code",
            "Number of transactions",
        )
        .with_counts(counts),
    )
}

/// Mean amount per card brand. Transactions whose card is unknown, or whose
/// amount is missing, do not contribute.
pub fn avg_amount_by_brand_series(cards: &Table, transactions: &Table) -> Option<ChartSeries> {
    let lookup = CardBrandLookup::build(cards)?;
    let card_idx = transactions.column_index("card_id")?;
    let amount_idx = transactions.column_index("amount")?;

    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut unmatched = 0;
    for row in &transactions.rows {
        let brand = match lookup.brand_of(&row[card_idx]) {
            Lookup::Matched(brand) => brand,
            Lookup::Unmatched => {
                unmatched += 1;
                continue;
            }
        };
        let (Some(label), Some(amount)) = (brand.label(), row[amount_idx].as_f64()) else {
            continue;
        };
        let entry = sums.entry(label).or_insert((0.0, 0));
        entry.0 += amount;
        entry.1 += 1;
    }
    if unmatched > 0 {
        warn!("transactions: {} rows reference unknown cards", unmatched);
    }

    let mut averages: Vec<SeriesPoint> = sums
        .into_iter()
        .map(|(label, (sum, n))| SeriesPoint {
            label,
            value: sum / n as f64,
        })
        .collect();
    averages.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.label.cmp(&b.label))
    });

    let mut series = ChartSeries::new(
        "avg_amount_by_brand",
        "Average transaction amount by card brand",
        ChartKind::Bar,
        "Card brand",
        "Average amount",
    );
    series.points = averages;
    Some(series)
}

/// Derive every series the tables allow.
pub fn build_chart_data(users: &Table, cards: &Table, transactions: &Table) -> ChartData {
    let series: Vec<ChartSeries> = [
        gender_series(users),
        card_type_series(cards),
        age_series(users),
        transaction_method_series(transactions),
        top_mcc_series(transactions),
        avg_amount_by_brand_series(cards, transactions),
        card_brand_series(cards),
    ]
    .into_iter()
    .flatten()
    .collect();

    debug!("derived {} chart series", series.len());
    ChartData { series }
}
