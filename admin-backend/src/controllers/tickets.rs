use actix_web::{web, HttpRequest, Responder};

use super::ensure_profile;
use crate::db::{embed, Database, Filter, Page, ProfileIndex, Required};
use crate::middleware::session_auth::require_role;
use crate::models::{
    CreateTicketMessageRequest, CreateTicketRequest, ListTicketsQuery, Ticket, TicketDetail, TicketMessage,
    TicketMessageView, TicketView, UpdateTicketRequest, ANY_ROLE, STAFF,
};
use crate::response::{bad_request, deleted, forbidden, internal_error, not_found, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/tickets")
            .route("", web::get().to(list_tickets))
            .route("/{id}", web::get().to(get_ticket))
            .route("/{id}", web::patch().to(update_ticket))
            .route("/{id}", web::delete().to(delete_ticket)),
    )
    .service(
        web::scope("/api/tickets")
            .route("", web::post().to(open_ticket))
            .route("/mine", web::get().to(my_tickets))
            .route("/{id}/messages", web::post().to(add_message)),
    );
}

fn ticket_view(index: &ProfileIndex, ticket: Ticket) -> TicketView {
    TicketView {
        requester: embed(index, Some(&ticket.requester_id)),
        assignee: embed(index, ticket.assignee_id.as_deref()),
        ticket,
    }
}

/// Requester and assignee resolved from a single batched lookup
fn with_profiles(db: &Database, tickets: Vec<Ticket>) -> rusqlite::Result<Vec<TicketView>> {
    let index = db.profiles_for(&tickets, |t| [Some(t.requester_id.as_str()), t.assignee_id.as_deref()])?;
    Ok(tickets.into_iter().map(|t| ticket_view(&index, t)).collect())
}

fn with_authors(db: &Database, messages: Vec<TicketMessage>) -> rusqlite::Result<Vec<TicketMessageView>> {
    let index = db.profiles_for(&messages, |m| [m.author_id.as_deref()])?;
    Ok(messages
        .into_iter()
        .map(|message| TicketMessageView {
            author: embed(&index, message.author_id.as_deref()),
            message,
        })
        .collect())
}

fn detail(db: &Database, ticket: Ticket) -> rusqlite::Result<TicketDetail> {
    let messages = with_authors(db, db.list_ticket_messages(&ticket.id)?)?;
    let mut views = with_profiles(db, vec![ticket])?;
    let ticket = views.pop().ok_or(rusqlite::Error::QueryReturnedNoRows)?;
    Ok(TicketDetail { ticket, messages })
}

async fn list_tickets(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListTicketsQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let filter = Filter::new()
        .eq("status", query.status)
        .eq("priority", query.priority)
        .eq("assignee_id", query.assignee_id.as_deref());
    let tickets = state
        .db
        .list_tickets(&filter, Page::new(query.limit, query.offset))
        .and_then(|tickets| with_profiles(&state.db, tickets));
    match tickets {
        Ok(tickets) => ok(tickets),
        Err(e) => internal_error("Failed to list tickets", e),
    }
}

async fn get_ticket(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let ticket = match state.db.get_ticket(&path) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return not_found("Ticket not found"),
        Err(e) => return internal_error("Failed to load ticket", e),
    };
    match detail(&state.db, ticket) {
        Ok(detail) => ok(detail),
        Err(e) => internal_error("Failed to load ticket", e),
    }
}

async fn open_ticket(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateTicketRequest>,
) -> impl Responder {
    let caller = match require_role(&state, &req, ANY_ROLE).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let ticket = match Ticket::from_request(&body, &caller.id) {
        Ok(ticket) => ticket,
        Err(msg) => return bad_request(msg),
    };
    let saved = state
        .db
        .insert_ticket(&ticket)
        .and_then(|()| with_profiles(&state.db, vec![ticket]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to open ticket", e),
    }
}

async fn my_tickets(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListTicketsQuery>,
) -> impl Responder {
    let caller = match require_role(&state, &req, ANY_ROLE).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let filter = Filter::new()
        .eq("requester_id", Some(&caller.id))
        .eq("status", query.status)
        .eq("priority", query.priority);
    let tickets = state
        .db
        .list_tickets(&filter, Page::new(query.limit, query.offset))
        .and_then(|tickets| with_profiles(&state.db, tickets));
    match tickets {
        Ok(tickets) => ok(tickets),
        Err(e) => internal_error("Failed to list tickets", e),
    }
}

async fn update_ticket(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateTicketRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let mut ticket = match state.db.get_ticket(&path).required() {
        Ok(ticket) => ticket,
        Err(e) => return internal_error("Failed to update ticket", e),
    };
    ticket.apply(&body);
    if let Err(resp) = ensure_profile(&state.db, "assignee_id", ticket.assignee_id.as_deref()) {
        return resp;
    }

    let saved = state
        .db
        .save_ticket(&ticket)
        .and_then(|()| with_profiles(&state.db, vec![ticket]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to update ticket", e),
    }
}

async fn add_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CreateTicketMessageRequest>,
) -> impl Responder {
    let caller = match require_role(&state, &req, ANY_ROLE).await {
        Ok(caller) => caller,
        Err(resp) => return resp,
    };

    let ticket = match state.db.get_ticket(&path).required() {
        Ok(ticket) => ticket,
        Err(e) => return internal_error("Failed to add message", e),
    };
    if ticket.requester_id != caller.id && !caller.has_role(STAFF) {
        return forbidden("Only the requester or staff can reply");
    }

    let message = match TicketMessage::new(&ticket.id, &caller.id, body.body.as_deref()) {
        Ok(message) => message,
        Err(msg) => return bad_request(msg),
    };
    let saved = state
        .db
        .insert_ticket_message(&message)
        .and_then(|()| with_authors(&state.db, vec![message]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to add message", e),
    }
}

async fn delete_ticket(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let id = path.into_inner();
    match state.db.delete_ticket(&id) {
        Ok(removed) => deleted(id, removed),
        Err(e) => internal_error("Failed to delete ticket", e),
    }
}
