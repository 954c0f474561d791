use serde::Deserialize;
use serde_json::Value;

/// Envelope every endpoint answers with: global metadata plus one
/// `QueryResult` per queried entity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestResponse {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub responses: Vec<QueryResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub num_results: i64,
    #[serde(default)]
    pub num_matches: i64,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RestResponse {
    /// The index-th record of the first query result, the access pattern
    /// nearly every caller wants.
    pub fn get_result(&self, index: usize) -> Option<&Value> {
        self.responses.first().and_then(|r| r.results.get(index))
    }

    pub fn first_result(&self) -> Option<&Value> {
        self.get_result(0)
    }

    pub fn num_results(&self) -> i64 {
        self.responses.first().map(|r| r.num_results).unwrap_or(0)
    }

    /// Messages of every ERROR event, top-level and per-result.
    pub fn error_messages(&self) -> Vec<String> {
        self.events
            .iter()
            .chain(self.responses.iter().flat_map(|r| r.events.iter()))
            .filter(|e| e.kind.eq_ignore_ascii_case("error"))
            .filter_map(|e| e.message.clone())
            .collect()
    }

    /// Best-effort extraction of an error message from a raw failure body.
    /// Bodies that are not the standard envelope yield None.
    pub(crate) fn error_detail(body: &str) -> Option<String> {
        let parsed: RestResponse = serde_json::from_str(body).ok()?;
        let messages = parsed.error_messages();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_result_reads_the_first_query_result() {
        let response: RestResponse = serde_json::from_value(json!({
            "apiVersion": "v2",
            "responses": [
                {"numResults": 2, "results": [{"id": "a"}, {"id": "b"}]},
                {"numResults": 1, "results": [{"id": "c"}]}
            ]
        }))
        .unwrap();

        assert_eq!(response.num_results(), 2);
        assert_eq!(response.get_result(1).unwrap()["id"], "b");
        assert!(response.get_result(2).is_none());
    }

    #[test]
    fn error_detail_collects_error_events() {
        let body = json!({
            "events": [
                {"type": "ERROR", "message": "study not found"},
                {"type": "INFO", "message": "ignored"}
            ],
            "responses": []
        })
        .to_string();
        assert_eq!(
            RestResponse::error_detail(&body).unwrap(),
            "study not found"
        );
        assert!(RestResponse::error_detail("not json").is_none());
    }
}
