use actix_web::{web, HttpRequest, Responder};

use super::ensure_profile;
use crate::db::{embed, Database, Filter, Page, Required};
use crate::middleware::session_auth::require_role;
use crate::models::{
    billing_overview, CreateSubscriptionRequest, ListSubscriptionsQuery, Subscription, SubscriptionView,
    UpdateSubscriptionRequest, ADMIN_ONLY,
};
use crate::response::{bad_request, internal_error, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/subscriptions")
            .route("", web::get().to(list_subscriptions))
            .route("", web::post().to(create_subscription))
            .route("/{id}", web::patch().to(update_subscription)),
    )
    .service(web::resource("/api/admin/billing/overview").route(web::get().to(overview)));
}

fn with_profiles(db: &Database, subscriptions: Vec<Subscription>) -> rusqlite::Result<Vec<SubscriptionView>> {
    let index = db.profiles_for(&subscriptions, |s| [Some(s.profile_id.as_str())])?;
    Ok(subscriptions
        .into_iter()
        .map(|subscription| SubscriptionView {
            profile: embed(&index, Some(&subscription.profile_id)),
            subscription,
        })
        .collect())
}

async fn list_subscriptions(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListSubscriptionsQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let filter = Filter::new()
        .eq("status", query.status)
        .eq("plan", query.plan.as_deref());
    let subscriptions = state
        .db
        .list_subscriptions(&filter, Page::new(query.limit, query.offset))
        .and_then(|subscriptions| with_profiles(&state.db, subscriptions));
    match subscriptions {
        Ok(subscriptions) => ok(subscriptions),
        Err(e) => internal_error("Failed to list subscriptions", e),
    }
}

async fn create_subscription(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateSubscriptionRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let subscription = match Subscription::from_request(&body) {
        Ok(subscription) => subscription,
        Err(msg) => return bad_request(msg),
    };
    if let Err(resp) = ensure_profile(&state.db, "profile_id", Some(&subscription.profile_id)) {
        return resp;
    }

    let saved = state
        .db
        .insert_subscription(&subscription)
        .and_then(|()| with_profiles(&state.db, vec![subscription]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to create subscription", e),
    }
}

async fn update_subscription(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateSubscriptionRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    let mut subscription = match state.db.get_subscription(&path).required() {
        Ok(subscription) => subscription,
        Err(e) => return internal_error("Failed to update subscription", e),
    };
    let previous = subscription.status;
    if let Err(msg) = subscription.apply(&body) {
        return bad_request(msg);
    }
    if subscription.status != previous {
        log::info!(
            "Subscription {} changed {} -> {}",
            subscription.id,
            previous,
            subscription.status
        );
    }

    let saved = state
        .db
        .save_subscription(&subscription)
        .and_then(|()| with_profiles(&state.db, vec![subscription]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to update subscription", e),
    }
}

async fn overview(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, ADMIN_ONLY).await {
        return resp;
    }

    match state.db.all_subscriptions(&Filter::new()) {
        Ok(subscriptions) => ok(billing_overview(&subscriptions)),
        Err(e) => internal_error("Failed to build billing overview", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::controllers::test_support::{bearer, test_app, test_state, user_with_token};
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_subscriptions_feed_the_overview() {
        let state = test_state();
        let (_, admin) = user_with_token(&state, "admin@example.com", Role::Admin);
        let (customer, _) = user_with_token(&state, "customer@example.com", Role::Employee);
        let app = test_app!(state);

        let plans = [
            json!({ "profile_id": customer.id, "plan": "pro", "amount": 49 }),
            json!({ "profile_id": customer.id, "plan": "pro", "amount": 480, "billing_interval": "yearly" }),
            json!({ "profile_id": customer.id, "plan": "starter", "amount": 19, "status": "trialing" }),
        ];
        let mut ids = Vec::new();
        for plan in plans {
            let req = test::TestRequest::post()
                .uri("/api/admin/subscriptions")
                .insert_header(bearer(&admin))
                .set_json(plan)
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["data"]["profile"]["email"], "customer@example.com");
            ids.push(body["data"]["id"].as_str().unwrap().to_string());
        }

        let req = test::TestRequest::get()
            .uri("/api/admin/billing/overview")
            .insert_header(bearer(&admin))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["mrr"], 89.0);
        assert_eq!(body["data"]["arr"], 1068.0);
        assert_eq!(body["data"]["total_subscriptions"], 3);
        assert_eq!(body["data"]["by_status"]["trialing"], 1);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/admin/subscriptions/{}", ids[0]))
            .insert_header(bearer(&admin))
            .set_json(json!({ "status": "canceled" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["canceled_at"].is_string());

        let req = test::TestRequest::get()
            .uri("/api/admin/subscriptions?status=active&plan=pro")
            .insert_header(bearer(&admin))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/admin/billing/overview")
            .insert_header(bearer(&admin))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["mrr"], 40.0);
    }

    #[actix_web::test]
    async fn test_create_validation() {
        let state = test_state();
        let (_, admin) = user_with_token(&state, "admin@example.com", Role::Admin);
        let (customer, _) = user_with_token(&state, "customer@example.com", Role::Employee);
        let (_, manager) = user_with_token(&state, "manager@example.com", Role::Manager);
        let app = test_app!(state);

        let cases = [
            json!({ "profile_id": "ghost", "plan": "pro", "amount": 49 }),
            json!({ "profile_id": customer.id, "plan": "pro", "amount": -1 }),
            json!({ "profile_id": customer.id, "amount": 49 }),
            json!({ "profile_id": customer.id, "plan": "pro", "amount": 49, "billing_interval": "weekly" }),
        ];
        for case in cases {
            let req = test::TestRequest::post()
                .uri("/api/admin/subscriptions")
                .insert_header(bearer(&admin))
                .set_json(case)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::get()
            .uri("/api/admin/billing/overview")
            .insert_header(bearer(&manager))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
