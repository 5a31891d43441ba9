// API client module: a small blocking HTTP client for the WolframAlpha v2
// query endpoint. One GET per query, no retries, no caching.

use crate::config::Config;
use crate::error::QueryError;
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

/// Public website page for a query, printed under results when `show_url`
/// is enabled.
pub const WEB_INPUT_URL: &str = "https://www.wolframalpha.com/input/";

/// Holds a reqwest blocking client and the query settings taken from the
/// config at construction time.
#[derive(Clone)]
pub struct WolframClient {
    client: Client,
    api_url: String,
    api_key: String,
    fetch_pics: bool,
}

impl WolframClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("wolframalpha-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(WolframClient {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            fetch_pics: config.fetch_pics,
        })
    }

    pub fn fetch_pics(&self) -> bool {
        self.fetch_pics
    }

    /// Build the request URL: `input` and `appid`, plus `format=plaintext`
    /// unless pictures were requested.
    pub fn query_url(&self, input: &str) -> Result<Url, QueryError> {
        let mut params = vec![("input", input), ("appid", self.api_key.as_str())];
        if !self.fetch_pics {
            params.push(("format", "plaintext"));
        }
        Ok(Url::parse_with_params(&self.api_url, &params)?)
    }

    /// Send one query and return the raw XML body.
    pub fn query(&self, input: &str) -> Result<String, QueryError> {
        let url = self.query_url(input)?;
        debug!(input, fetch_pics = self.fetch_pics, "sending query");
        self.get_ok(url)?.text().map_err(QueryError::from)
    }

    /// Download the bytes of a picture referenced by a result.
    pub fn fetch_image(&self, src: &str) -> Result<Vec<u8>, QueryError> {
        let url = Url::parse(src)?;
        debug!(%url, "fetching picture");
        let bytes = self.get_ok(url)?.bytes()?;
        Ok(bytes.to_vec())
    }

    fn get_ok(&self, url: Url) -> Result<reqwest::blocking::Response, QueryError> {
        let res = self.client.get(url).send()?;
        let status = res.status();
        if !status.is_success() {
            debug!(%status, "request rejected");
            return Err(QueryError::Status { status });
        }
        Ok(res)
    }
}

/// Link to the query on wolframalpha.com.
pub fn web_url(input: &str) -> String {
    match Url::parse_with_params(WEB_INPUT_URL, &[("i", input)]) {
        Ok(url) => url.to_string(),
        Err(_) => WEB_INPUT_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(fetch_pics: bool) -> WolframClient {
        let config = Config {
            api_key: "KEY&1".into(),
            fetch_pics,
            ..Config::default()
        };
        WolframClient::new(&config).unwrap()
    }

    #[test]
    fn query_url_escapes_input_and_key() {
        let url = client(false).query_url("integrate x^2 dx & more").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("input".to_string(), "integrate x^2 dx & more".to_string()),
                ("appid".to_string(), "KEY&1".to_string()),
                ("format".to_string(), "plaintext".to_string()),
            ]
        );
        assert!(url.as_str().starts_with("https://api.wolframalpha.com/v2/query?"));
    }

    #[test]
    fn query_url_omits_format_when_fetching_pictures() {
        let url = client(true).query_url("pi").unwrap();
        assert!(!url.query_pairs().any(|(k, _)| k == "format"));
    }

    #[test]
    fn web_url_points_at_the_website() {
        let url = web_url("2 + 2");
        assert!(url.starts_with("https://www.wolframalpha.com/input/?i="));
        assert!(!url.contains(' '));
    }

    #[test]
    fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/v2/query")
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .create();

        let config = Config {
            api_key: "k".into(),
            api_url: format!("{}/v2/query", server.url()),
            ..Config::default()
        };
        let err = WolframClient::new(&config).unwrap().query("x").unwrap_err();
        mock.assert();
        assert!(matches!(err, QueryError::Status { status } if status.as_u16() == 403));
    }
}
