use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::{AnalysisAccepted, CancelToken, CaptureSubmitter};
use crate::config::Config;
use crate::error::SubmissionError;
use crate::record::CaptureSnapshot;

const LOG_TARGET: &str = "lesion_capture::submission";

/// Upload endpoint, relative to the API base URL
pub const UPLOAD_PATH: &str = "/skin-lesions/upload-and-analyze";

/// Longest server error detail kept in an error message
const MAX_DETAIL_LEN: usize = 300;

/// Upload API response structure
#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    needs_review: ReviewFlags,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewFlags {
    #[serde(default)]
    cadre: bool,
    #[serde(default)]
    doctor: bool,
}

/// Error body returned by the API (`{"detail": ...}`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Submits captures as a multipart upload over HTTP
pub struct HttpSubmitter {
    client: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpSubmitter {
    pub fn new(
        api_base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("LesionCapture/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SubmissionError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", api_base_url.trim_end_matches('/'), UPLOAD_PATH),
            auth_token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SubmissionError> {
        Self::new(
            &config.api_base_url,
            config.auth_token.clone(),
            config.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CaptureSubmitter for HttpSubmitter {
    fn submit_capture(
        &self,
        snapshot: &CaptureSnapshot,
        cancel: &CancelToken,
    ) -> Result<AnalysisAccepted, SubmissionError> {
        if cancel.is_cancelled() {
            return Err(SubmissionError::Cancelled);
        }

        let form = build_form(snapshot)?;
        tracing::info!(
            target: LOG_TARGET,
            "Uploading capture {} ({} bytes, region={}) to {}",
            snapshot.session_id,
            snapshot.image.len(),
            snapshot.body_region,
            self.endpoint
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .multipart(form);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| {
            tracing::error!(target: LOG_TARGET, "Upload transport error: {}", e);
            SubmissionError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response.text().unwrap_or_default());
            let err = map_status(status.as_u16(), detail);
            tracing::error!(target: LOG_TARGET, "Upload failed: {}", err);
            return Err(err);
        }

        let parsed: UploadResponse = response
            .json()
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;

        if !parsed.success {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                detail: parsed.message,
            });
        }

        tracing::info!(
            target: LOG_TARGET,
            "Capture {} accepted (cadre review: {}, doctor review: {})",
            snapshot.session_id,
            parsed.needs_review.cadre,
            parsed.needs_review.doctor
        );

        Ok(AnalysisAccepted {
            needs_cadre_review: parsed.needs_review.cadre,
            needs_doctor_review: parsed.needs_review.doctor,
            ..AnalysisAccepted::new(parsed.message)
        })
    }
}

/// Map a non-2xx status to a typed error
fn map_status(status: u16, detail: String) -> SubmissionError {
    match status {
        401 | 403 => SubmissionError::Unauthorized,
        400 | 413 | 415 | 422 => SubmissionError::Rejected { status, detail },
        _ => SubmissionError::Server { status, detail },
    }
}

/// Pull `detail` out of an API error body, falling back to the raw text
fn error_detail(body: String) -> String {
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(text),
        }) => text,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    };

    if detail.len() > MAX_DETAIL_LEN {
        let mut end = MAX_DETAIL_LEN;
        while !detail.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &detail[..end])
    } else {
        detail
    }
}

fn build_form(snapshot: &CaptureSnapshot) -> Result<Form, SubmissionError> {
    let image = Part::bytes(snapshot.image.bytes().to_vec())
        .file_name(snapshot.image.file_name())
        .mime_str(snapshot.image.media_type())
        .map_err(|e| SubmissionError::InvalidRequest(e.to_string()))?;

    let mut form = Form::new()
        .part("image", image)
        .text("body_region", snapshot.body_region.code());

    // Structured copies for newer backends; `notes` carries them for the rest
    if let Some(location) = &snapshot.custom_location {
        form = form.text("custom_location", location.clone());
    }
    if let Some(symptoms) = snapshot.symptom_codes() {
        form = form.text("symptoms", symptoms);
    }
    if let Some(tier) = snapshot.highest_severity {
        form = form.text("severity", tier.code());
    }
    if let Some(notes) = snapshot.backend_notes() {
        form = form.text("notes", notes);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{sample_png, ArtifactSource, ImageArtifact};
    use crate::camera::Facing;
    use crate::record::{BodyRegion, SeverityTier, SymptomCode};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use uuid::Uuid;

    const OK_BODY: &str = r#"{"success":true,"message":"Skin lesion analysis completed","needs_review":{"cadre":true,"doctor":false}}"#;

    fn snapshot() -> CaptureSnapshot {
        CaptureSnapshot {
            session_id: Uuid::new_v4(),
            image: ImageArtifact::from_bytes(
                sample_png(3, 3),
                ArtifactSource::CameraFrame {
                    facing: Facing::Environment,
                },
            )
            .unwrap(),
            body_region: BodyRegion::Other,
            custom_location: Some("left shoulder blade".into()),
            symptoms: vec![SymptomCode::Itching, SymptomCode::Bleeding],
            highest_severity: Some(SeverityTier::High),
            notes: Some("appeared in spring".into()),
        }
    }

    fn submitter(base_url: &str, token: Option<&str>) -> HttpSubmitter {
        HttpSubmitter::new(base_url, token.map(str::to_string), Duration::from_secs(5)).unwrap()
    }

    /// Serve one request with a canned response; returns the raw request text
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
                if line == "\r\n" {
                    break;
                }
            }
            let mut body_bytes = vec![0u8; content_length];
            reader.read_exact(&mut body_bytes).unwrap();

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();

            head + &String::from_utf8_lossy(&body_bytes)
        });

        (base_url, handle)
    }

    /// Text of the form field `name` in a raw multipart request
    fn field<'a>(request: &'a str, name: &str) -> Option<&'a str> {
        let marker = format!("name=\"{}\"\r\n\r\n", name);
        let start = request.find(&marker)? + marker.len();
        let len = request[start..].find("\r\n")?;
        Some(&request[start..start + len])
    }

    #[test]
    fn test_upload_carries_all_fields() {
        let snap = snapshot();
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", OK_BODY);
        submitter(&base_url, None)
            .submit_capture(&snap, &CancelToken::new())
            .unwrap();

        let request = server.join().unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("content-type: multipart/form-data; boundary="));
        assert!(lower.contains("name=\"image\"; filename=\"lesion_"));
        assert!(lower.contains("content-type: image/png"));
        assert_eq!(field(&request, "body_region"), Some("other"));
        assert_eq!(field(&request, "custom_location"), Some("left shoulder blade"));
        assert_eq!(field(&request, "symptoms"), Some("itching,bleeding"));
        assert_eq!(field(&request, "severity"), Some("high"));
        assert_eq!(
            field(&request, "notes").map(str::to_string),
            snap.backend_notes()
        );
        assert!(request.contains("appeared in spring\nLocation: left shoulder blade"));
        assert!(request.contains("Symptoms: Itching, Bleeding"));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let mut snap = snapshot();
        snap.body_region = BodyRegion::Face;
        snap.custom_location = None;
        snap.symptoms.clear();
        snap.highest_severity = None;
        snap.notes = None;

        let (base_url, server) = serve_once("HTTP/1.1 200 OK", OK_BODY);
        submitter(&base_url, None)
            .submit_capture(&snap, &CancelToken::new())
            .unwrap();

        let request = server.join().unwrap();
        assert_eq!(field(&request, "body_region"), Some("face"));
        assert!(!request.contains("name=\"custom_location\""));
        assert!(!request.contains("name=\"symptoms\""));
        assert!(!request.contains("name=\"severity\""));
        assert!(!request.contains("name=\"notes\""));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(401, String::new()), SubmissionError::Unauthorized);
        assert_eq!(map_status(403, String::new()), SubmissionError::Unauthorized);
        assert!(matches!(
            map_status(422, "bad".into()),
            SubmissionError::Rejected { status: 422, .. }
        ));
        assert!(matches!(
            map_status(500, "boom".into()),
            SubmissionError::Server { status: 500, .. }
        ));
    }

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(
            error_detail(r#"{"detail":"File must be an image"}"#.to_string()),
            "File must be an image"
        );
        assert_eq!(error_detail("  plain failure ".to_string()), "plain failure");

        let long = "x".repeat(MAX_DETAIL_LEN + 50);
        assert_eq!(error_detail(long).len(), MAX_DETAIL_LEN + 3);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        assert_eq!(
            submitter("http://api.local/", None).endpoint(),
            "http://api.local/skin-lesions/upload-and-analyze"
        );
    }

    #[test]
    fn test_cancelled_before_send() {
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            submitter("http://127.0.0.1:9", None).submit_capture(&snapshot(), &token),
            Err(SubmissionError::Cancelled)
        );
    }

    #[test]
    fn test_successful_upload() {
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", OK_BODY);

        let accepted = submitter(&base_url, Some("secret-token"))
            .submit_capture(&snapshot(), &CancelToken::new())
            .unwrap();
        assert_eq!(accepted.message, "Skin lesion analysis completed");
        assert!(accepted.needs_cadre_review);
        assert!(!accepted.needs_doctor_review);

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /skin-lesions/upload-and-analyze"));
        assert!(request.contains("Bearer secret-token"));
    }

    #[test]
    fn test_server_rejection() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 400 Bad Request",
            r#"{"detail":"File must be an image"}"#,
        );

        let err = submitter(&base_url, None)
            .submit_capture(&snapshot(), &CancelToken::new())
            .unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Rejected {
                status: 400,
                detail: "File must be an image".into()
            }
        );
        server.join().unwrap();
    }

    #[test]
    fn test_unsuccessful_body_is_rejected() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"success":false,"message":"Image too blurry"}"#,
        );

        let err = submitter(&base_url, None)
            .submit_capture(&snapshot(), &CancelToken::new())
            .unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Rejected {
                status: 200,
                detail: "Image too blurry".into()
            }
        );
        server.join().unwrap();
    }
}
