mod loader;
mod model;

pub use loader::{
    load_json_file, load_products_data, load_search_cases, load_users_csv, PRODUCTS_FILE,
    SEARCH_CASES_FILE, USERS_FILE,
};
pub use model::{SearchCase, UserRow};
