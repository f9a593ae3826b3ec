use serde::Deserialize;

/// CSS selectors for the storefront's home and results pages.
///
/// Defaults target the live storefront; every entry can be overridden from
/// the config file when the markup changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub search_input: String,
    pub search_button: String,
    pub header: String,
    pub logo: String,
    pub login_button: String,
    pub cart_button: String,

    /// Every checkbox of the price facet.
    pub price_filter_inputs: String,
    /// Candidate buttons for the price accordion; matched by `price_accordion_label`.
    pub price_accordion: String,
    pub price_accordion_label: String,
    pub show_all_filters: String,

    pub product_grid: String,
    pub product_card: String,
    /// Relative to a product card.
    pub product_name: String,
    /// Relative to a product card.
    pub product_price: String,
    /// Relative to a product card.
    pub product_rating: String,
    pub load_more: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search_input: "input[data-testid='fs-input']".into(),
            search_button: "button[data-testid='fs-search-button']".into(),
            header: "[data-testid='fs-navbar-header']".into(),
            logo: "img[title='Americanas']".into(),
            login_button: ".ButtonLogin_Container__sgzuk, a[href='/login']".into(),
            cart_button: "button[data-testid='cart-toggle']".into(),
            price_filter_inputs: "input[data-fs-input='true'][type='checkbox']".into(),
            price_accordion: "button[aria-expanded]".into(),
            price_accordion_label: "Preço".into(),
            show_all_filters: "button.FilterFacetCheckbox_showAll__e_whq".into(),
            product_grid: ".ProductGrid_productGallery__n3L6E".into(),
            product_card: ".ProductCard_productCard__MwY4X".into(),
            product_name: ".ProductCard_productName__mwx7Y".into(),
            product_price: ".ProductCard_productPrice__XFEqu".into(),
            product_rating: ".avg-rating".into(),
            load_more: "button[data-testid='pagination-button']".into(),
        }
    }
}

impl Selectors {
    /// The header elements that must all be visible on the home page.
    pub fn header_elements(&self) -> [(&'static str, &str); 6] {
        [
            ("header", self.header.as_str()),
            ("logo", self.logo.as_str()),
            ("search input", self.search_input.as_str()),
            ("search button", self.search_button.as_str()),
            ("login button", self.login_button.as_str()),
            ("cart button", self.cart_button.as_str()),
        ]
    }
}
