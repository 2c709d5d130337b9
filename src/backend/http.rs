use bytes::Bytes;
use log::trace;
use reqwest::header::{HeaderValue, RANGE};
use reqwest::{Client, IntoUrl, Method, Request, StatusCode, Url};

use crate::async_reader::AsyncBackend;
use crate::{PmtError, PmtResult};

/// Remote archive access through HTTP range requests.
pub struct HttpBackend {
    client: Client,
    url: Url,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Fails if `url` cannot be parsed.
    pub fn try_from<U: IntoUrl>(client: Client, url: U) -> PmtResult<Self> {
        Ok(HttpBackend {
            client,
            url: url.into_url()?,
        })
    }
}

/// Value of the `Range` header covering `length` bytes from `offset`.
fn range_header(offset: usize, length: usize) -> PmtResult<HeaderValue> {
    let end = offset
        .checked_add(length)
        .ok_or(PmtError::InvalidEntry)?
        .saturating_sub(1);
    Ok(HeaderValue::try_from(format!("bytes={offset}-{end}"))?)
}

/// Checks that a response answered the range request for `requested` bytes.
fn check_range_response(status: StatusCode, received: usize, requested: usize) -> PmtResult<()> {
    if status != StatusCode::PARTIAL_CONTENT {
        return Err(PmtError::RangeRequestsUnsupported);
    }
    if received > requested {
        return Err(PmtError::ResponseBodyTooLong(received, requested));
    }
    Ok(())
}

impl AsyncBackend for HttpBackend {
    async fn read(&self, offset: usize, length: usize) -> PmtResult<Bytes> {
        if length == 0 {
            return Ok(Bytes::new());
        }
        trace!("GET {} bytes={offset}+{length}", self.url);

        let mut req = Request::new(Method::GET, self.url.clone());
        req.headers_mut().insert(RANGE, range_header(offset, length)?);

        let response = self.client.execute(req).await?.error_for_status()?;
        let status = response.status();
        if status != StatusCode::PARTIAL_CONTENT {
            return Err(PmtError::RangeRequestsUnsupported);
        }

        let response_bytes = response.bytes().await?;
        check_range_response(status, response_bytes.len(), length)?;
        Ok(response_bytes)
    }
}
