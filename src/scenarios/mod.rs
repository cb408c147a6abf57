mod catalog;
#[cfg(feature = "cli")]
mod printer;
mod runner;

pub use catalog::{product_schema, CATEGORY_KEYS};
#[cfg(feature = "cli")]
pub use printer::{print_listing, print_result, print_summary};
pub use runner::{run_scenario, SuiteSummary};

use std::path::Path;

use regex::Regex;

use crate::{
    client::ApiClient,
    error::{FixtureError, HarnessResult},
    fixtures::{load_search_cases, SearchCase, SEARCH_CASES_FILE},
    report::Report,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioKind {
    BrandsList,
    Categories,
    ProductsList,
    SingleProduct,
    SearchProduct(SearchCase),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub epic: &'static str,
    pub feature: &'static str,
    pub tags: &'static [&'static str],
    pub kind: ScenarioKind,
}

impl Scenario {
    pub fn brands_list() -> Self {
        Self {
            name: "brands_list".to_string(),
            epic: "Brands",
            feature: "GET /brandsList",
            tags: &["functional", "smoke"],
            kind: ScenarioKind::BrandsList,
        }
    }

    pub fn categories() -> Self {
        Self {
            name: "categories".to_string(),
            epic: "Products",
            feature: "GET /categories",
            tags: &["smoke", "functional"],
            kind: ScenarioKind::Categories,
        }
    }

    pub fn products_list() -> Self {
        Self {
            name: "products_list".to_string(),
            epic: "Products",
            feature: "GET /productsList",
            tags: &["smoke", "regression"],
            kind: ScenarioKind::ProductsList,
        }
    }

    pub fn single_product() -> Self {
        Self {
            name: "single_product".to_string(),
            epic: "Products",
            feature: "GET /productsList",
            tags: &["functional"],
            kind: ScenarioKind::SingleProduct,
        }
    }

    pub fn search_product(case: SearchCase) -> Self {
        Self {
            name: format!("search_product[{}]", case.name),
            epic: "Products",
            feature: "POST /searchProduct",
            tags: &["functional"],
            kind: ScenarioKind::SearchProduct(case),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}::{}", self.epic, self.name)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub async fn execute(&self, client: &ApiClient, report: &Report) -> HarnessResult<()> {
        match &self.kind {
            ScenarioKind::BrandsList => catalog::brands_list(client, report).await,
            ScenarioKind::Categories => catalog::categories(client, report).await,
            ScenarioKind::ProductsList => catalog::products_list(client, report).await,
            ScenarioKind::SingleProduct => catalog::single_product(client, report).await,
            ScenarioKind::SearchProduct(case) => catalog::search_product(client, report, case).await,
        }
    }
}

/// An ordered selection of scenarios.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    /// The full catalogue; search cases come from `search_products.json` in
    /// `data_dir`.
    pub fn standard(data_dir: &Path) -> Result<Self, FixtureError> {
        let cases = load_search_cases(&data_dir.join(SEARCH_CASES_FILE))?;
        Ok(Self::with_search_cases(cases))
    }

    pub fn with_search_cases(cases: Vec<SearchCase>) -> Self {
        let mut scenarios = vec![
            Scenario::brands_list(),
            Scenario::categories(),
            Scenario::products_list(),
            Scenario::single_product(),
        ];
        scenarios.extend(cases.into_iter().map(Scenario::search_product));
        Self { scenarios }
    }

    pub fn filter(mut self, pattern: &Regex) -> Self {
        self.scenarios
            .retain(|s| pattern.is_match(&s.name) || pattern.is_match(&s.full_name()));
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.scenarios.retain(|s| s.has_tag(tag));
        self
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
