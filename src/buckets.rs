// 🎂 Age buckets shared by the SQL report and the chart series

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBucket {
    Under30,
    Thirties,
    Forties,
    Fifties,
    Sixties,
    SeventyPlus,
}

impl AgeBucket {
    /// Buckets in ascending age order
    pub const ALL: [AgeBucket; 6] = [
        AgeBucket::Under30,
        AgeBucket::Thirties,
        AgeBucket::Forties,
        AgeBucket::Fifties,
        AgeBucket::Sixties,
        AgeBucket::SeventyPlus,
    ];

    /// Lower bounds are closed: 30 is `30-39`, 70 is `70+`.
    ///
    /// A missing or non-numeric age lands in `70+`, which is where the
    /// SQL `CASE ... ELSE` puts it.
    pub fn for_age(age: Option<f64>) -> AgeBucket {
        match age {
            Some(a) if a < 30.0 => AgeBucket::Under30,
            Some(a) if a < 40.0 => AgeBucket::Thirties,
            Some(a) if a < 50.0 => AgeBucket::Forties,
            Some(a) if a < 60.0 => AgeBucket::Fifties,
            Some(a) if a < 70.0 => AgeBucket::Sixties,
            _ => AgeBucket::SeventyPlus,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::Under30 => "<30",
            AgeBucket::Thirties => "30-39",
            AgeBucket::Forties => "40-49",
            AgeBucket::Fifties => "50-59",
            AgeBucket::Sixties => "60-69",
            AgeBucket::SeventyPlus => "70+",
        }
    }

    /// Upper bound (exclusive) of the bucket, None for the open-ended one.
    fn upper_bound(&self) -> Option<u32> {
        match self {
            AgeBucket::Under30 => Some(30),
            AgeBucket::Thirties => Some(40),
            AgeBucket::Forties => Some(50),
            AgeBucket::Fifties => Some(60),
            AgeBucket::Sixties => Some(70),
            AgeBucket::SeventyPlus => None,
        }
    }

    /// `CASE` expression assigning `column` to a bucket label.
    pub fn sql_label_case(column: &str) -> String {
        // Text cells never compare numerically, same as `Value::as_f64`
        let mut sql = format!(
            "CASE WHEN typeof({}) NOT IN ('integer', 'real') THEN '{}'",
            column,
            AgeBucket::SeventyPlus.label()
        );
        for bucket in Self::ALL {
            match bucket.upper_bound() {
                Some(bound) => sql.push_str(&format!(
                    " WHEN {} < {} THEN '{}'",
                    column,
                    bound,
                    bucket.label()
                )),
                None => sql.push_str(&format!(" ELSE '{}'", bucket.label())),
            }
        }
        sql.push_str(" END");
        sql
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_ages_belong_to_upper_bucket() {
        let ages = [29, 30, 39, 40, 59, 60, 69, 70, 95];
        let expected = [
            "<30", "30-39", "30-39", "40-49", "50-59", "60-69", "60-69", "70+", "70+",
        ];

        let labels: Vec<&str> = ages
            .iter()
            .map(|a| AgeBucket::for_age(Some(*a as f64)).label())
            .collect();

        assert_eq!(labels, expected);
    }

    #[test]
    fn test_missing_age_is_seventy_plus() {
        assert_eq!(AgeBucket::for_age(None), AgeBucket::SeventyPlus);
    }

    #[test]
    fn test_fractional_ages_use_closed_lower_bound() {
        assert_eq!(AgeBucket::for_age(Some(39.5)), AgeBucket::Thirties);
        assert_eq!(AgeBucket::for_age(Some(29.99)), AgeBucket::Under30);
    }

    #[test]
    fn test_sql_case_shape() {
        let sql = AgeBucket::sql_label_case("current_age");
        assert!(sql.starts_with("CASE WHEN typeof(current_age) NOT IN ('integer', 'real') THEN '70+'"));
        assert!(sql.contains("WHEN current_age < 30 THEN '<30'"));
        assert!(sql.ends_with("ELSE '70+' END"));
        assert_eq!(sql.matches("WHEN").count(), 6);
    }
}
