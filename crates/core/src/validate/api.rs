use super::attribute::validate_attribute;
use crate::design::{Design, Response, SchemeId, SecurityKind, SecurityRef};
use crate::error::ValidationErrors;

const SCHEMES: &[&str] = &["http", "https", "ws", "wss"];

pub(super) fn validate_api(design: &Design, ctx: &str, verr: &mut ValidationErrors) {
    let Some(api) = design.api() else {
        return;
    };
    let prov = api.prov.as_ref();
    if api.name.is_empty() {
        verr.add(ctx, prov, "API name cannot be empty");
    }
    if let Some(base) = &api.base_path {
        if !base.starts_with('/') {
            verr.add(ctx, prov, format!("base path {:?} must start with /", base));
        }
    }
    for scheme in &api.schemes {
        if !SCHEMES.contains(&scheme.as_str()) {
            verr.add(
                ctx,
                prov,
                format!("invalid scheme {:?}, must be one of {}", scheme, SCHEMES.join(", ")),
            );
        }
    }
    if let Some(params) = &api.base_params {
        validate_attribute(design, ctx, "base params", params, verr);
    }
    if let Some(sec) = &api.security {
        validate_security_ref(design, ctx, sec, verr);
    }
    for resp in api.responses.values() {
        validate_response(design, ctx, resp, verr);
    }
}

pub(super) fn validate_scheme(design: &Design, ctx: &str, id: SchemeId, verr: &mut ValidationErrors) {
    let scheme = &design.schemes()[id.0];
    let prov = scheme.prov.as_ref();
    if scheme.name.is_empty() {
        verr.add(ctx, prov, "security scheme name cannot be empty");
    }
    match scheme.kind {
        SecurityKind::ApiKey if scheme.key_name.is_none() || scheme.key_location.is_none() => {
            verr.add(
                ctx,
                prov,
                "api-key security scheme requires a key name and location, use in_header or in_query",
            )
        }
        SecurityKind::OAuth2 if scheme.token_url.is_none() => {
            verr.add(ctx, prov, "oauth2 security scheme requires a token URL")
        }
        _ => {}
    }
}

pub(super) fn validate_security_ref(
    design: &Design,
    ctx: &str,
    sec: &SecurityRef,
    verr: &mut ValidationErrors,
) {
    let prov = sec.prov.as_ref();
    let Some(scheme) = design.scheme(&sec.scheme) else {
        verr.add(ctx, prov, format!("unknown security scheme {:?}", sec.scheme));
        return;
    };
    if sec.scopes.is_empty() {
        return;
    }
    if !matches!(scheme.kind, SecurityKind::OAuth2 | SecurityKind::Jwt) {
        verr.add(
            ctx,
            prov,
            format!("scopes require an oauth2 or jwt security scheme, {:?} is {}", scheme.name, scheme.kind),
        );
        return;
    }
    for scope in &sec.scopes {
        if !scheme.scopes.contains_key(scope) {
            verr.add(
                ctx,
                prov,
                format!("scope {:?} is not declared by security scheme {:?}", scope, scheme.name),
            );
        }
    }
}

pub(super) fn validate_response(
    design: &Design,
    ctx: &str,
    resp: &Response,
    verr: &mut ValidationErrors,
) {
    let prov = resp.prov.as_ref();
    match resp.status {
        None => verr.add(ctx, prov, format!("response {:?} has no status", resp.name)),
        Some(s) if !(100..=599).contains(&s) => verr.add(
            ctx,
            prov,
            format!("response {:?} has invalid status {}", resp.name, s),
        ),
        Some(_) => {}
    }
    if let Some(media) = &resp.media_type {
        match design.find_media_type(media) {
            None => verr.add(
                ctx,
                prov,
                format!("response {:?} uses unknown media type {:?}", resp.name, media),
            ),
            Some(id) => {
                let view = resp.view.as_deref().unwrap_or(crate::design::media::DEFAULT_VIEW);
                let ut = design.user_type(id);
                let known = ut.media.as_ref().is_some_and(|m| {
                    m.views.contains_key(view) || (m.views.is_empty() && m.is_collection())
                });
                if resp.view.is_some() && !known {
                    verr.add(
                        ctx,
                        prov,
                        format!(
                            "response {:?} uses view {:?}, which media type {:?} does not define",
                            resp.name, view, ut.name
                        ),
                    );
                }
            }
        }
    }
    if let Some(headers) = &resp.headers {
        validate_attribute(design, ctx, "headers", headers, verr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{KeyLocation, SecurityScheme};

    fn messages(verr: ValidationErrors) -> Vec<String> {
        verr.iter().map(|e| e.message.clone()).collect()
    }

    fn check_scheme(scheme: SecurityScheme) -> Vec<String> {
        let mut d = Design::new();
        d.schemes.push(scheme);
        let mut verr = ValidationErrors::new();
        validate_scheme(&d, "security scheme \"s\"", SchemeId(0), &mut verr);
        messages(verr)
    }

    fn check_ref(d: &Design, scheme: &str, scopes: &[&str]) -> Vec<String> {
        let sec = SecurityRef {
            scheme: scheme.into(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            prov: None,
        };
        let mut verr = ValidationErrors::new();
        validate_security_ref(d, "API \"cellar\"", &sec, &mut verr);
        messages(verr)
    }

    fn check_status(status: Option<u16>) -> Vec<String> {
        let mut resp = Response::new("Teapot");
        resp.status = status;
        let mut verr = ValidationErrors::new();
        validate_response(&Design::new(), "API \"cellar\"", &resp, &mut verr);
        messages(verr)
    }

    #[test]
    fn api_key_needs_name_and_location() {
        let mut key = SecurityScheme::new("key", SecurityKind::ApiKey);
        key.key_name = Some("X-Key".into());
        assert_eq!(
            check_scheme(key.clone()),
            vec!["api-key security scheme requires a key name and location, use in_header or in_query"]
        );
        key.key_location = Some(KeyLocation::Header);
        assert!(check_scheme(key).is_empty());
    }

    #[test]
    fn oauth2_needs_token_url() {
        let mut oauth = SecurityScheme::new("oauth", SecurityKind::OAuth2);
        assert_eq!(
            check_scheme(oauth.clone()),
            vec!["oauth2 security scheme requires a token URL"]
        );
        oauth.token_url = Some("https://auth.example.com/token".into());
        assert!(check_scheme(oauth).is_empty());
    }

    #[test]
    fn scopes_must_be_declared_by_the_scheme() {
        let mut d = Design::new();
        let mut oauth = SecurityScheme::new("oauth", SecurityKind::OAuth2);
        oauth.scopes.insert("read".into(), "read access".into());
        d.schemes.push(oauth);
        let mut jwt = SecurityScheme::new("jwt", SecurityKind::Jwt);
        jwt.scopes.insert("admin".into(), "administration".into());
        d.schemes.push(jwt);
        d.schemes.push(SecurityScheme::new("basic", SecurityKind::Basic));

        assert!(check_ref(&d, "oauth", &["read"]).is_empty());
        assert!(check_ref(&d, "jwt", &["admin"]).is_empty());
        assert_eq!(
            check_ref(&d, "oauth", &["read", "write"]),
            vec!["scope \"write\" is not declared by security scheme \"oauth\""]
        );
        let errs = check_ref(&d, "basic", &["read"]);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("scopes require an oauth2 or jwt security scheme"));
    }

    #[test]
    fn response_status_must_be_in_range() {
        assert!(check_status(Some(418)).is_empty());
        assert_eq!(
            check_status(Some(99)),
            vec!["response \"Teapot\" has invalid status 99"]
        );
        assert_eq!(
            check_status(Some(600)),
            vec!["response \"Teapot\" has invalid status 600"]
        );
        assert_eq!(check_status(None), vec!["response \"Teapot\" has no status"]);
    }
}
