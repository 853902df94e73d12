use askama::{Error as AskamaError, Template};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

pub fn render_template<T: Template>(template: T) -> Result<String, TemplateRenderError> {
    template.render().map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
    })
}

pub struct ErrorPageView {
    pub status_code: u16,
    pub title: String,
    pub message: String,
    /// Shop page configured to be shown for missing pages.
    pub cms_page_id: Option<String>,
}

impl ErrorPageView {
    pub fn not_found(cms_page_id: Option<String>) -> Self {
        Self {
            status_code: 404,
            title: "Page not found".to_string(),
            message: "The page you requested could not be found.".to_string(),
            cms_page_id,
        }
    }

    pub fn server_error(status_code: u16) -> Self {
        Self {
            status_code,
            title: "Something went wrong".to_string(),
            message: "We could not process your request. Please try again later.".to_string(),
            cms_page_id: None,
        }
    }
}

#[derive(Template)]
#[template(path = "error_page.html")]
pub struct ErrorPageTemplate {
    pub view: ErrorPageView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_page_exposes_cms_page() {
        let html = render_template(ErrorPageTemplate {
            view: ErrorPageView::not_found(Some("c0ffee".into())),
        })
        .expect("render");

        assert!(html.contains("data-status=\"404\""));
        assert!(html.contains("data-cms-page-id=\"c0ffee\""));
        assert!(html.contains("Page not found"));
    }

    #[test]
    fn server_error_page_has_no_cms_page() {
        let html = render_template(ErrorPageTemplate {
            view: ErrorPageView::server_error(503),
        })
        .expect("render");

        assert!(html.contains("data-status=\"503\""));
        assert!(!html.contains("data-cms-page-id"));
    }
}
