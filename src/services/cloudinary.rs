const CDN_HOST_MARKER: &str = "cloudinary.com";
const UPLOAD_MARKER: &str = "/upload/";
const BEST_QUALITY_TRANSFORM: &str = "q_auto:best,f_auto,dpr_auto,c_fill,g_center";

fn inject_after_upload(url: &str, transformations: &str) -> Option<String> {
    if !url.contains(CDN_HOST_MARKER) {
        return None;
    }
    let mut parts = url.split(UPLOAD_MARKER);
    let (head, tail) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(format!("{head}{UPLOAD_MARKER}{transformations}/{tail}"))
}

pub fn enhance_url(url: &str) -> String {
    inject_after_upload(url, BEST_QUALITY_TRANSFORM).unwrap_or_else(|| url.to_string())
}

pub fn responsive_url(url: &str, width: u32, height: u32) -> String {
    let transformations =
        format!("w_{width},h_{height},c_fill,g_center,q_auto:best,f_auto,dpr_auto");
    inject_after_upload(url, &transformations).unwrap_or_else(|| url.to_string())
}
