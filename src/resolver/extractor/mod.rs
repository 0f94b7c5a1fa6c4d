pub mod drive;
pub mod hdhub;
pub mod hubcloud;

pub use drive::DriveLocator;
pub use hdhub::HdHubExtractor;
pub use hubcloud::HubCloudExtractor;

/// `scheme://host` part of a link
pub(crate) fn origin_of(link: &str) -> String {
    link.split('/').take(3).collect::<Vec<_>>().join("/")
}

/// Join a root-relative path onto an origin
pub(crate) fn absolutize(link: &str, origin: &str) -> String {
    if link.starts_with('/') {
        format!("{origin}{link}")
    } else {
        link.to_string()
    }
}
