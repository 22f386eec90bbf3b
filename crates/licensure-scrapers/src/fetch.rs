use crate::context::LookupContext;
use crate::error::{LookupError, Result};
use licensure_core::JurisdictionCode;
use reqwest::{RequestBuilder, StatusCode};
use tracing::debug;

pub(crate) const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Send a request under the lookup's guard and return the body of a
/// 200 response. Any other status is an [`LookupError::Http`] carrying the
/// raw body.
pub(crate) async fn fetch_text(
    ctx: &LookupContext,
    state: &JurisdictionCode,
    step: &'static str,
    request: RequestBuilder,
) -> Result<String> {
    ctx.guard(state, step, async {
        let response = request
            .send()
            .await
            .map_err(LookupError::transport(state, step))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(LookupError::transport(state, step))?;

        debug!(
            state = %state,
            step,
            status = status.as_u16(),
            bytes = body.len(),
            "response received"
        );
        if status != StatusCode::OK {
            return Err(LookupError::Http {
                state: state.to_string(),
                step,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    })
    .await
}
