use crate::api::admin::ClearRequest;
use crate::api::calculate::CalculateResponse;
use crate::api::results::{
    CityListResponse, PageQuery, ResultListResponse, SalaryListResponse,
};
use crate::calc::EmployeeContribution;
use crate::model::city::CityStandard;
use crate::model::result::ContributionResult;
use crate::model::salary::SalaryRecord;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social Insurance Contribution API",
        version = "1.0.0",
        description = r#"
## Social Insurance Contribution Calculator

This API powers a small back-office tool that turns uploaded payroll
spreadsheets into **company social-insurance contribution amounts**.

### 🔹 Workflow
- **Upload**
  - Monthly salary rows (`.xlsx` / `.xls` / `.ods` / `.csv`)
  - Per-city contribution standards (base range and rate)
- **Calculate**
  - Average each employee's uploaded months
  - Clamp the average into the city standard's `[base_min, base_max]`
  - Multiply by the rate and store one result row per employee
- **Review**
  - Page through stored results, salaries, and standards
- **Reset**
  - Clear individual tables or everything at once

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::upload::upload_salaries,
        crate::api::upload::upload_cities,

        crate::api::calculate::calculate,

        crate::api::results::list_results,
        crate::api::results::list_salaries,
        crate::api::results::list_cities,

        crate::api::admin::clear_tables
    ),
    components(
        schemas(
            SalaryRecord,
            CityStandard,
            ContributionResult,
            EmployeeContribution,
            CalculateResponse,
            ResultListResponse,
            SalaryListResponse,
            CityListResponse,
            PageQuery,
            ClearRequest
        )
    ),
    tags(
        (name = "Upload", description = "Spreadsheet upload APIs"),
        (name = "Calculation", description = "Contribution calculation APIs"),
        (name = "Results", description = "Stored data readback APIs"),
        (name = "Admin", description = "Table maintenance APIs"),
    )
)]
pub struct ApiDoc;
