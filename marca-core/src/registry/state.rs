/// States the registry site can land us on after a navigation. The site
/// redirects freely between them, so classification is re-run after every
/// navigation instead of trusting the target URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    LoginRequired,
    SearchReady,
    Unknown,
}

/// Markup fragments that identify the authentication wall.
pub const LOGIN_MARKERS: &[&str] = &["Acesso ao sistema", "Login", "Usuário"];

/// The search page announces itself with this heading...
pub const SEARCH_PAGE_MARKER: &str = "Pesquisa básica";

/// ...together with at least one of these (a domain keyword or the known
/// search-field identifier).
pub const SEARCH_CONTEXT_MARKERS: &[&str] = &["marca", "expressaoPesquisa"];

pub fn classify(content: &str) -> PageState {
    if LOGIN_MARKERS.iter().any(|marker| content.contains(marker)) {
        return PageState::LoginRequired;
    }
    if content.contains(SEARCH_PAGE_MARKER)
        && SEARCH_CONTEXT_MARKERS
            .iter()
            .any(|marker| content.contains(marker))
    {
        return PageState::SearchReady;
    }
    PageState::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_wall_is_detected() {
        let content = "<html><body><h1>Acesso ao sistema</h1><form>...</form></body></html>";
        assert_eq!(classify(content), PageState::LoginRequired);
    }

    #[test]
    fn search_page_requires_heading_and_context() {
        let ready = "<h2>Pesquisa básica</h2><input name=\"expressaoPesquisa\">";
        assert_eq!(classify(ready), PageState::SearchReady);

        let heading_only = "<h2>Pesquisa básica</h2><p>sem formulário</p>";
        assert_eq!(classify(heading_only), PageState::Unknown);
    }

    #[test]
    fn login_markers_win_over_search_markers() {
        let both = "Login expirado. Pesquisa básica de marca indisponível.";
        assert_eq!(classify(both), PageState::LoginRequired);
    }

    #[test]
    fn unrelated_markup_is_unknown() {
        assert_eq!(classify("<html><body>404</body></html>"), PageState::Unknown);
    }
}
