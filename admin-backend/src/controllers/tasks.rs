use actix_web::{web, HttpRequest, Responder};

use super::ensure_profile;
use crate::db::{embed, Database, Filter, Page, Required};
use crate::middleware::session_auth::require_role;
use crate::models::{
    CreateTaskRequest, ListTasksQuery, Task, TaskView, UpdateTaskRequest, ANY_ROLE, STAFF,
};
use crate::response::{bad_request, deleted, internal_error, ok};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/tasks")
            .route("", web::get().to(list_tasks))
            .route("", web::post().to(create_task))
            .route("/{id}", web::patch().to(update_task))
            .route("/{id}", web::delete().to(delete_task)),
    );
    cfg.service(web::resource("/api/tasks/mine").route(web::get().to(my_tasks)));
}

/// Embed assignee and creator from one batched profile lookup
fn with_profiles(db: &Database, tasks: Vec<Task>) -> rusqlite::Result<Vec<TaskView>> {
    let index = db.profiles_for(&tasks, |t| [t.assigned_to.as_deref(), t.created_by.as_deref()])?;
    Ok(tasks
        .into_iter()
        .map(|task| TaskView {
            assignee: embed(&index, task.assigned_to.as_deref()),
            creator: embed(&index, task.created_by.as_deref()),
            task,
        })
        .collect())
}

fn list_views(db: &Database, filter: &Filter, page: Page) -> rusqlite::Result<Vec<TaskView>> {
    with_profiles(db, db.list_tasks(filter, page)?)
}

async fn list_tasks(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListTasksQuery>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let filter = Filter::new()
        .eq("status", query.status)
        .eq("priority", query.priority)
        .eq("assigned_to", query.assigned_to.as_deref());

    match list_views(&state.db, &filter, Page::new(query.limit, query.offset)) {
        Ok(tasks) => ok(tasks),
        Err(e) => internal_error("Failed to list tasks", e),
    }
}

async fn my_tasks(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListTasksQuery>,
) -> impl Responder {
    let caller = match require_role(&state, &req, ANY_ROLE).await {
        Ok(profile) => profile,
        Err(resp) => return resp,
    };

    let filter = Filter::new()
        .eq("assigned_to", Some(&caller.id))
        .eq("status", query.status)
        .eq("priority", query.priority);

    match list_views(&state.db, &filter, Page::new(query.limit, query.offset)) {
        Ok(tasks) => ok(tasks),
        Err(e) => internal_error("Failed to list tasks", e),
    }
}

async fn create_task(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateTaskRequest>,
) -> impl Responder {
    let caller = match require_role(&state, &req, STAFF).await {
        Ok(profile) => profile,
        Err(resp) => return resp,
    };

    let task = match Task::from_request(&body, &caller.id) {
        Ok(task) => task,
        Err(msg) => return bad_request(msg),
    };
    if let Err(resp) = ensure_profile(&state.db, "assigned_to", task.assigned_to.as_deref()) {
        return resp;
    }

    let saved = state.db.insert_task(&task).and_then(|()| with_profiles(&state.db, vec![task]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to create task", e),
    }
}

async fn update_task(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateTaskRequest>,
) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let mut task = match state.db.get_task(&path).required() {
        Ok(task) => task,
        Err(e) => return internal_error("Failed to update task", e),
    };
    if let Err(msg) = task.apply(&body) {
        return bad_request(msg);
    }
    if let Err(resp) = ensure_profile(&state.db, "assigned_to", task.assigned_to.as_deref()) {
        return resp;
    }

    let saved = state.db.save_task(&task).and_then(|()| with_profiles(&state.db, vec![task]));
    match saved {
        Ok(mut views) => ok(views.pop()),
        Err(e) => internal_error("Failed to update task", e),
    }
}

async fn delete_task(state: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    if let Err(resp) = require_role(&state, &req, STAFF).await {
        return resp;
    }

    let id = path.into_inner();
    match state.db.delete_task(&id) {
        Ok(removed) => deleted(id, removed),
        Err(e) => internal_error("Failed to delete task", e),
    }
}
