//! HTML parsing and data extraction for Endole company pages
//!
//! A company page embeds its financial summary in a separate frame. The
//! extractor finds that frame, and in the frame's document reads the value
//! sitting next to the "Turnover" label.
//!
//! `scraper::Html` is not `Send`, so every function here takes a body
//! string and returns owned values; no parsed document outlives the call.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::{FetchError, FetchedValue};

/// Frame holding the financials tile
const FINANCIALS_FRAME_SELECTOR: &str =
    "iframe[src*='tile=financials'], frame[src*='tile=financials']";

/// Label whose sibling `div` holds the figure
const TURNOVER_LABEL: &str = "Turnover";

/// Turnover extractor for Endole company and financials pages
pub struct TurnoverExtractor {
    frame_selector: Selector,
    div_selector: Selector,
    form_selector: Selector,
    hidden_input_selector: Selector,
}

impl TurnoverExtractor {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            frame_selector: parse_selector(FINANCIALS_FRAME_SELECTOR)?,
            div_selector: parse_selector("div")?,
            form_selector: parse_selector("form")?,
            hidden_input_selector: parse_selector("input[type='hidden'][name]")?,
        })
    }

    /// Absolute URL of the financials frame on a company page, if present.
    pub fn financials_frame_url(&self, body: &str, page_url: &Url) -> Option<Url> {
        let html = Html::parse_document(body);
        let src = html
            .select(&self.frame_selector)
            .find_map(|frame| frame.value().attr("src"))?;
        let resolved = page_url.join(src).ok();
        debug!("Financials frame: {:?}", resolved.as_ref().map(Url::as_str));
        resolved
    }

    /// Read the turnover figure from a financials document.
    ///
    /// Looks for the first `div` whose own text contains the label and takes
    /// the text of its next sibling `div`. Anything missing or blank is
    /// `FetchedValue::NotFound`.
    pub fn extract_turnover(&self, body: &str) -> FetchedValue {
        let html = Html::parse_document(body);

        for div in html.select(&self.div_selector) {
            if !self.has_label(&div) {
                continue;
            }
            let sibling = div
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "div");
            if let Some(value) = sibling {
                let text: String = value.text().collect();
                return FetchedValue::from_extracted(Some(&text));
            }
        }

        FetchedValue::NotFound
    }

    /// Parse the login form: submit URL plus hidden fields such as CSRF tokens.
    pub fn login_form(&self, body: &str, page_url: &Url) -> LoginForm {
        let html = Html::parse_document(body);
        let form = html.select(&self.form_selector).next();

        let action = form
            .and_then(|f| f.value().attr("action"))
            .filter(|a| !a.trim().is_empty())
            .and_then(|a| page_url.join(a).ok())
            .unwrap_or_else(|| page_url.clone());

        let hidden_fields = form
            .map(|f| {
                f.select(&self.hidden_input_selector)
                    .filter_map(|input| {
                        let name = input.value().attr("name")?;
                        let value = input.value().attr("value").unwrap_or_default();
                        Some((name.to_string(), value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        LoginForm {
            action,
            hidden_fields,
        }
    }

    fn has_label(&self, div: &ElementRef) -> bool {
        div.children()
            .filter_map(|node| node.value().as_text())
            .any(|text| text.contains(TURNOVER_LABEL))
    }
}

/// Login form parsed from the sign-in page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Url,
    pub hidden_fields: Vec<(String, String)>,
}

impl LoginForm {
    /// Form fields to submit for the given credentials.
    pub fn fields(&self, email: &str, password: &str) -> Vec<(String, String)> {
        let mut fields = self.hidden_fields.clone();
        fields.push(("email".to_string(), email.to_string()));
        fields.push(("password".to_string(), password.to_string()));
        fields
    }
}

fn parse_selector(selector: &str) -> Result<Selector, FetchError> {
    Selector::parse(selector)
        .map_err(|e| FetchError::extraction(format!("invalid selector '{selector}': {e}")))
}
