use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use derive_more::{Display, Error};
use serde::Serialize;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::{city::CityStandard, salary::SalaryRecord};

#[derive(Debug, Display, Error)]
pub enum CalcError {
    #[display(fmt = "no salary rows have been uploaded yet")]
    NoSalaries,

    #[display(fmt = "no city standard has been uploaded yet")]
    NoCityStandard,

    #[display(fmt = "storage error: {}", _0)]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for CalcError {
    fn from(e: sqlx::Error) -> Self {
        CalcError::Db(e)
    }
}

impl CalcError {
    /// Caller-fixable states, as opposed to storage failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CalcError::NoSalaries | CalcError::NoCityStandard)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeContribution {
    #[schema(example = "Alice")]
    pub employee_name: String,

    #[schema(example = 9000.0)]
    pub avg_salary: f64,

    #[schema(example = 8500.0)]
    pub contribution_base: f64,

    #[schema(example = 1360.0)]
    pub company_fee: f64,
}

/// Derive one contribution row per employee from raw salary rows.
///
/// Rows are grouped by employee name in first-seen order, averaged, clamped
/// into the standard's `[base_min, base_max]`, then multiplied by its rate.
pub fn compute_contributions(
    salaries: &[SalaryRecord],
    standard: &CityStandard,
) -> Vec<EmployeeContribution> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<f64>> = HashMap::new();

    for row in salaries {
        grouped
            .entry(row.employee_name.as_str())
            .or_insert_with(|| {
                order.push(row.employee_name.as_str());
                Vec::new()
            })
            .push(row.salary_amount);
    }

    order
        .into_iter()
        .map(|name| {
            let amounts = &grouped[name];
            let avg_salary = amounts.iter().sum::<f64>() / amounts.len() as f64;

            // Explicit comparisons rather than f64::clamp: a malformed
            // standard with base_min > base_max must not panic, the low
            // bound wins.
            let contribution_base = if avg_salary < standard.base_min {
                standard.base_min
            } else if avg_salary > standard.base_max {
                standard.base_max
            } else {
                avg_salary
            };

            EmployeeContribution {
                employee_name: name.to_string(),
                avg_salary,
                contribution_base,
                company_fee: contribution_base * standard.rate,
            }
        })
        .collect()
}

/// Load inputs, run the calculation and store every result row in one bulk
/// insert. All rows of a run share the same `calculated_at` timestamp; runs
/// append, they never overwrite earlier ones.
pub async fn run_calculation(pool: &MySqlPool) -> Result<Vec<EmployeeContribution>, CalcError> {
    let run_id = Uuid::new_v4();

    let salaries = sqlx::query_as::<_, SalaryRecord>(
        "SELECT id, employee_id, employee_name, month, salary_amount FROM salaries ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    if salaries.is_empty() {
        return Err(CalcError::NoSalaries);
    }

    let standard_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cities")
        .fetch_one(pool)
        .await?;

    if standard_count == 0 {
        return Err(CalcError::NoCityStandard);
    }
    if standard_count > 1 {
        warn!(%run_id, standard_count, "multiple city standards stored, using the first");
    }

    let standard = sqlx::query_as::<_, CityStandard>(
        "SELECT id, city_name, year, base_min, base_max, rate FROM cities ORDER BY id LIMIT 1",
    )
    .fetch_one(pool)
    .await?;

    let results = compute_contributions(&salaries, &standard);
    let calculated_at: NaiveDateTime = Utc::now().naive_utc();

    let mut insert: QueryBuilder<MySql> = QueryBuilder::new(
        "INSERT INTO results (employee_name, avg_salary, contribution_base, company_fee, calculated_at) ",
    );
    insert.push_values(results.iter(), |mut row, r| {
        row.push_bind(&r.employee_name)
            .push_bind(r.avg_salary)
            .push_bind(r.contribution_base)
            .push_bind(r.company_fee)
            .push_bind(calculated_at);
    });
    insert.build().execute(pool).await?;

    info!(
        %run_id,
        city = %standard.city_name,
        salary_rows = salaries.len(),
        employees = results.len(),
        "calculation run stored"
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salary(name: &str, amount: f64) -> SalaryRecord {
        SalaryRecord {
            id: 0,
            employee_id: "1001".into(),
            employee_name: name.into(),
            month: "202401".into(),
            salary_amount: amount,
        }
    }

    fn standard(base_min: f64, base_max: f64, rate: f64) -> CityStandard {
        CityStandard {
            id: 1,
            city_name: "Shanghai".into(),
            year: "2024".into(),
            base_min,
            base_max,
            rate,
        }
    }

    #[test]
    fn averages_then_clamps_to_max() {
        let salaries = vec![
            salary("Alice", 8000.0),
            salary("Alice", 9000.0),
            salary("Alice", 10000.0),
        ];
        let results = compute_contributions(&salaries, &standard(3000.0, 8500.0, 0.16));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].avg_salary, 9000.0);
        assert_eq!(results[0].contribution_base, 8500.0);
        assert_eq!(results[0].company_fee, 1360.0);
    }

    #[test]
    fn clamps_to_min_when_below_range() {
        let salaries = vec![salary("Bob", 1500.0), salary("Bob", 2500.0)];
        let results = compute_contributions(&salaries, &standard(3000.0, 8500.0, 0.16));

        assert_eq!(results[0].avg_salary, 2000.0);
        assert_eq!(results[0].contribution_base, 3000.0);
        assert_eq!(results[0].company_fee, 480.0);
    }

    #[test]
    fn in_range_average_passes_through() {
        let salaries = vec![salary("Cara", 5000.0), salary("Cara", 6000.0)];
        let results = compute_contributions(&salaries, &standard(3000.0, 8500.0, 0.1));

        assert_eq!(results[0].avg_salary, 5500.0);
        assert_eq!(results[0].contribution_base, 5500.0);
        assert_eq!(results[0].company_fee, 550.0);
    }

    #[test]
    fn fee_is_exactly_base_times_rate() {
        let salaries = vec![salary("Dan", 4321.0)];
        let std_ = standard(3000.0, 8500.0, 0.165);
        let results = compute_contributions(&salaries, &std_);

        assert_eq!(results[0].company_fee, results[0].contribution_base * std_.rate);
    }

    #[test]
    fn groups_interleaved_rows_in_first_seen_order() {
        let salaries = vec![
            salary("Alice", 8000.0),
            salary("Bob", 4000.0),
            salary("Alice", 9000.0),
            salary("Bob", 5000.0),
        ];
        let results = compute_contributions(&salaries, &standard(3000.0, 20000.0, 0.1));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].employee_name, "Alice");
        assert_eq!(results[0].avg_salary, 8500.0);
        assert_eq!(results[1].employee_name, "Bob");
        assert_eq!(results[1].avg_salary, 4500.0);
    }

    #[test]
    fn single_month_average_is_the_amount() {
        let salaries = vec![salary("Eve", 7777.0)];
        let results = compute_contributions(&salaries, &standard(3000.0, 8500.0, 0.16));

        assert_eq!(results[0].avg_salary, 7777.0);
        assert_eq!(results[0].contribution_base, 7777.0);
    }

    #[test]
    fn inverted_bounds_do_not_panic_low_bound_wins() {
        let salaries = vec![salary("Fay", 4500.0)];
        let results = compute_contributions(&salaries, &standard(5000.0, 4000.0, 0.16));

        assert_eq!(results[0].contribution_base, 5000.0);
    }

    #[test]
    fn missing_inputs_are_client_errors_storage_is_not() {
        assert!(CalcError::NoSalaries.is_client_error());
        assert!(CalcError::NoCityStandard.is_client_error());
        assert!(!CalcError::Db(sqlx::Error::RowNotFound).is_client_error());
    }

    #[test]
    fn base_stays_within_bounds_for_spread_of_averages() {
        let std_ = standard(3000.0, 8500.0, 0.16);
        for amount in [0.0, 2999.99, 3000.0, 6000.0, 8500.0, 8500.01, 50000.0] {
            let results = compute_contributions(&[salary("G", amount)], &std_);
            assert!(results[0].contribution_base >= std_.base_min);
            assert!(results[0].contribution_base <= std_.base_max);
        }
    }
}
