//! Document synthesis through the public API.

use waypoint::schema::Response;
use waypoint::{
    Context, DateTimeFormat, Describe, Documented, Endpoint, Error, ErrorResponse, Fields, Flow,
    HttpError, Info, Param, Prop, Router, Values, json,
};

/// Base fields shared by several endpoints.
fn paged() -> Fields {
    Fields::new()
        .query(Param::new("page").of::<u32>())
        .query(Param::new("per_page").of::<u32>())
}

struct ListEvents {
    unavailable: Error,
}

impl ListEvents {
    fn new() -> Self {
        Self {
            unavailable: Error::Internal("calendar backend unavailable".into()),
        }
    }
}

impl Endpoint for ListEvents {
    fn describe() -> Describe {
        Describe::new()
            .summary("List events")
            .tag("events")
            .operation_id("listEvents")
    }

    fn fields() -> Fields {
        paged().extend(
            Fields::new()
                .query(Param::new("since").format(DateTimeFormat))
                .query(Param::new("page").of::<u32>().description("1-based"))
                .error(ErrorResponse::new("unavailable")),
        )
    }

    fn error(&self, field: &str) -> Option<&dyn HttpError> {
        (field == "unavailable").then_some(&self.unavailable as &dyn HttpError)
    }

    async fn handle(&self, _ctx: &mut Context, _values: Values) -> waypoint::Result<Flow> {
        Ok(Flow::Next)
    }
}

struct CreateEvent;

impl Endpoint for CreateEvent {
    fn describe() -> Describe {
        Describe::new()
            .summary("Create event")
            .response(201, Response::json("Created"))
    }

    fn fields() -> Fields {
        Fields::new()
            .body(Prop::new("title").of::<String>().required())
            .body(Prop::new("starts_at").format(DateTimeFormat).required())
    }

    async fn handle(&self, _ctx: &mut Context, _values: Values) -> waypoint::Result<Flow> {
        Ok(Flow::Next)
    }
}

#[test]
fn composed_fields_keep_base_order() {
    let ep = Documented::new(ListEvents::new());
    let names: Vec<_> = ep
        .document()
        .parameters
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, ["page", "per_page", "since"]);
    assert_eq!(
        ep.document().parameters[0].description.as_deref(),
        Some("1-based")
    );
}

#[test]
fn full_document() {
    let mut router = Router::new();
    router
        .get("/api/calendars/:calendar/events", Documented::new(ListEvents::new()))
        .post("/api/calendars/:calendar/events", Documented::new(CreateEvent));

    let doc = router.document(&Info::new("Calendar", "2.0.0"));
    let item = &doc["paths"]["/api/calendars/{calendar}/events"];

    let list = &item["get"];
    assert_eq!(list["operationId"], "listEvents");
    assert_eq!(list["tags"], json!(["events"]));
    assert_eq!(list["parameters"][2]["schema"], json!({ "type": "string", "format": "date-time" }));
    assert_eq!(list["responses"]["500"]["description"], "Internal error: calendar backend unavailable");
    assert_eq!(list["responses"]["200"]["description"], "Success");

    let create = &item["post"];
    assert!(create["responses"].get("200").is_none());
    assert_eq!(create["responses"]["201"]["description"], "Created");
    assert_eq!(
        create["requestBody"]["content"]["application/json"]["schema"]["required"],
        json!(["title", "starts_at"])
    );
    let properties = create["requestBody"]["content"]["application/json"]["schema"]["properties"]
        .as_object()
        .unwrap();
    assert_eq!(
        properties.keys().collect::<Vec<_>>(),
        ["title", "starts_at"],
        "body properties keep declaration order"
    );
}
