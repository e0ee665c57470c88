use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use askama::Template;

use crate::{
    auth::admin_validator,
    db::{self, NewRoom},
    models::{
        format_datetime, status_label, RoomRow, RoomType, STATUS_APPROVED, STATUS_REJECTED,
    },
    routes::{redirect_back, redirect_to},
    state::AppState,
    templates::{admin_menu, render, Page},
    uploads,
};

#[derive(Clone, Debug)]
struct RoomView {
    slug: String,
    type_label: &'static str,
    price: String,
    image: String,
    description: String,
    is_hidden: bool,
    is_liked: bool,
    booked: bool,
}

#[derive(Clone, Debug)]
struct RequestView {
    id: i64,
    client_name: String,
    client_email: String,
    room_slug: String,
    room_label: &'static str,
    room_price: String,
    start: String,
    end: String,
    total_price: String,
    status: &'static str,
}

#[derive(Clone, Debug)]
struct TypeOption {
    code: i64,
    label: &'static str,
    selected: bool,
}

#[derive(Clone, Debug)]
struct ServiceLine {
    title: String,
    price: String,
}

#[derive(Template)]
#[template(path = "home.html")]
struct AdminHomeTemplate {
    page: Page,
}

#[derive(Template)]
#[template(path = "admin_rooms.html")]
struct AdminRoomsTemplate {
    page: Page,
    rooms: Vec<RoomView>,
}

#[derive(Template)]
#[template(path = "room_form.html")]
struct RoomFormTemplate {
    page: Page,
    types: Vec<TypeOption>,
    price: String,
    description: String,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin_requests.html")]
struct AdminRequestsTemplate {
    page: Page,
    requests: Vec<RequestView>,
}

#[derive(Template)]
#[template(path = "admin_request.html")]
struct AdminRequestTemplate {
    page: Page,
    request: RequestView,
    services: Vec<ServiceLine>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(crate::auth::basic_auth_config());
    cfg.service(
        web::scope("/hotel-admins")
            .wrap(HttpAuthentication::basic(admin_validator))
            .service(web::resource("/").route(web::get().to(home)))
            .service(
                web::resource("/add-room/")
                    .route(web::get().to(show_add_room))
                    .route(web::post().to(add_room)),
            )
            .service(web::resource("/rooms/").route(web::get().to(list_rooms)))
            .service(web::resource("/hide-room/{slug}/").route(web::post().to(hide_room)))
            .service(web::resource("/unhide-room/{slug}/").route(web::post().to(unhide_room)))
            .service(web::resource("/delete-room/{slug}/").route(web::post().to(delete_room)))
            .service(web::resource("/requests/").route(web::get().to(list_requests)))
            .service(web::resource("/requests/{pk}/").route(web::get().to(request_detail)))
            .service(web::resource("/requests/{pk}/accept").route(web::post().to(accept_request)))
            .service(web::resource("/requests/{pk}/reject").route(web::post().to(reject_request))),
    );
}

fn page(title: &str) -> Page {
    Page::new(title, admin_menu())
}

async fn home() -> Result<HttpResponse> {
    Ok(render(AdminHomeTemplate {
        page: page("Admin Home Page"),
    }))
}

async fn list_rooms(state: web::Data<AppState>) -> Result<HttpResponse> {
    let rooms = db::all_rooms(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let mut views = Vec::with_capacity(rooms.len());
    for room in rooms {
        let booked = db::booking_for_room(&state.db, room.id).await.is_some();
        views.push(to_view(room, booked));
    }

    Ok(render(AdminRoomsTemplate {
        page: page("Available Rooms"),
        rooms: views,
    }))
}

async fn show_add_room() -> Result<HttpResponse> {
    Ok(render(RoomFormTemplate {
        page: page("Add Room"),
        types: type_options(None),
        price: String::new(),
        description: String::new(),
        errors: Vec::new(),
    }))
}

async fn add_room(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse> {
    let form = uploads::read_room_form(payload, &state.media_root).await?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            let selected = form.room_type.parse::<i64>().ok();
            return Ok(render(RoomFormTemplate {
                page: page("Add Room"),
                types: type_options(selected),
                price: form.price.clone(),
                description: form.description.clone(),
                errors: errors.messages(),
            }));
        }
    };

    let room = db::create_room(
        &state.db,
        NewRoom {
            room_type: fields.room_type,
            price: fields.price,
            image: fields.image,
            description: fields.description,
            slug: None,
        },
    )
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    log::info!("Room {} added", room.slug);
    Ok(redirect_to("/hotel-admins/rooms/"))
}

async fn hide_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    set_hidden(&state, &path.into_inner(), true, &req).await
}

async fn unhide_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    set_hidden(&state, &path.into_inner(), false, &req).await
}

async fn set_hidden(
    state: &AppState,
    slug: &str,
    hidden: bool,
    req: &HttpRequest,
) -> Result<HttpResponse> {
    let Some(room) = db::fetch_room_by_slug(&state.db, slug).await else {
        return Ok(HttpResponse::NotFound().body("Room not found"));
    };
    db::set_room_hidden(&state.db, room.id, hidden)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(redirect_back(req, "/hotel-admins/rooms/"))
}

async fn delete_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let Some(room) = db::fetch_room_by_slug(&state.db, &slug).await else {
        return Ok(HttpResponse::NotFound().body("Room not found"));
    };
    db::delete_room(&state.db, room.id)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    log::info!("Room {slug} deleted");
    Ok(redirect_back(&req, "/hotel-admins/rooms/"))
}

async fn list_requests(state: web::Data<AppState>) -> Result<HttpResponse> {
    let requests = db::pending_bookings(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?
        .into_iter()
        .map(to_request_view)
        .collect();

    Ok(render(AdminRequestsTemplate {
        page: page("Requests"),
        requests,
    }))
}

async fn request_detail(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let Some(detail) = db::booking_detail(&state.db, id).await else {
        return Ok(HttpResponse::NotFound().body("Booking not found"));
    };

    let services = db::services_for_booking(&state.db, id)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?
        .into_iter()
        .map(|service| ServiceLine {
            title: service.title,
            price: service.price,
        })
        .collect();

    Ok(render(AdminRequestTemplate {
        page: page("Request"),
        request: to_request_view(detail),
        services,
    }))
}

async fn accept_request(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    update_status(&state, path.into_inner(), STATUS_APPROVED).await
}

async fn reject_request(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    update_status(&state, path.into_inner(), STATUS_REJECTED).await
}

/// Unconditional status write; re-accepting or flipping an already
/// decided request is permitted.
async fn update_status(state: &AppState, id: i64, status: i64) -> Result<HttpResponse> {
    let found = db::set_booking_status(&state.db, id, status)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    if !found {
        return Ok(HttpResponse::NotFound().body("Booking not found"));
    }
    Ok(redirect_to("/hotel-admins/requests/"))
}

fn to_view(row: RoomRow, booked: bool) -> RoomView {
    RoomView {
        slug: row.slug.clone(),
        type_label: row.type_label(),
        price: row.price.clone(),
        image: row.image.clone(),
        description: row.description.clone(),
        is_hidden: row.is_hidden == 1,
        is_liked: row.is_liked == 1,
        booked,
    }
}

fn to_request_view(row: crate::models::BookingDetailRow) -> RequestView {
    RequestView {
        id: row.id,
        client_name: format!("{} {}", row.client_first_name, row.client_last_name),
        client_email: row.client_email.clone(),
        room_slug: row.room_slug.clone(),
        room_label: row.room_type_label(),
        room_price: row.room_price.clone(),
        start: format_datetime(&row.start_book),
        end: format_datetime(&row.end_book),
        total_price: row.total_price.clone(),
        status: status_label(row.approve_status),
    }
}

fn type_options(selected: Option<i64>) -> Vec<TypeOption> {
    RoomType::all()
        .into_iter()
        .map(|room_type| TypeOption {
            code: room_type as i64,
            label: room_type.label(),
            selected: selected == Some(room_type as i64),
        })
        .collect()
}
