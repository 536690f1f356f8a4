//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use plinth_core::{Design, Scope, SecurityKind};

pub const ACCOUNT: &str = "application/vnd.goa.example.account";
pub const BOTTLE: &str = "application/vnd.goa.example.bottle";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small but complete design: an API with key security, two related
/// media types, a nested resource and a generated collection.
pub fn cellar(s: &mut Scope<'_, Design>) {
    s.api("cellar", |a| {
        a.title("The virtual wine cellar");
        a.description("A basic example of a CRUD API");
        a.host("localhost:8080");
        a.scheme("https");
        a.base_path("/cellar");
        a.consumes("application/json");
        a.produces("application/json");
        a.security("api_key", &[]);
        a.response("NotFound", |r| r.description("Resource not found"));
    });

    s.security_scheme("api_key", SecurityKind::ApiKey, |k| {
        k.description("Shared secret");
        k.in_header("X-Shared-Secret");
    });
    s.security_scheme("open", SecurityKind::None, |_| {});

    s.media_type(ACCOUNT, |t| {
        t.description("A tenant account");
        t.attribute_with("id", "Integer", |a| {
            a.description("ID of account");
            a.minimum(1.0);
        });
        t.attribute("href", "String");
        t.attribute_with("name", "String", |a| a.max_length(100));
        t.attribute_with("created_at", "DateTime", |a| a.read_only());
        t.required(&["id", "href", "name"]);
        t.view("default", |v| {
            v.attribute("id");
            v.attribute("href");
            v.attribute("name");
            v.attribute("created_at");
        });
        t.view("link", |v| {
            v.attribute("id");
            v.attribute("href");
        });
    });

    s.media_type(BOTTLE, |t| {
        t.description("A bottle of wine");
        t.attribute("id", "Integer");
        t.attribute("href", "String");
        t.attribute_with("name", "String", |a| a.min_length(2));
        t.attribute_with("vintage", "Integer", |a| {
            a.minimum(1900.0);
            a.maximum(2030.0);
        });
        t.attribute_with("color", "String", |a| {
            a.enum_values(["red", "white", "rose"]);
            a.default("red");
        });
        t.attribute("account", ACCOUNT);
        t.link("account");
        t.required(&["id", "name"]);
        t.view("default", |v| {
            v.attribute("id");
            v.attribute("href");
            v.attribute("name");
            v.attribute("vintage");
            v.attribute("links");
        });
        t.view("tiny", |v| {
            v.attribute("id");
            v.attribute("name");
        });
    });

    s.type_("BottlePayload", |t| {
        t.attribute_with("name", "String", |a| a.min_length(2));
        t.attribute("vintage", "Integer");
        t.required(&["name"]);
    });

    s.resource("account", |r| {
        r.description("Tenant accounts");
        r.base_path("/accounts");
        r.default_media(ACCOUNT);
        r.action("show", |a| {
            a.get("/:accountID");
            a.response("OK");
        });
    });

    s.resource("bottle", |r| {
        r.parent("account");
        r.base_path("/bottles");
        r.default_media(BOTTLE);
        r.action("list", |a| {
            a.get("");
            a.scope().collection_of(BOTTLE);
            a.response_with("OK", |r| r.media(&format!("{}; type=collection", BOTTLE)));
        });
        r.action("show", |a| {
            a.get("/:bottleID");
            a.params(|p| p.attribute("bottleID", "Integer"));
            a.response("OK");
        });
        r.action("create", |a| {
            a.post("");
            a.payload("BottlePayload");
            a.response("Created");
            a.no_security();
        });
    });
}
