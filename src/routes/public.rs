use actix_web::{web, HttpRequest, HttpResponse, Result};
use askama::Template;
use chrono::Utc;
use serde::Deserialize;

use crate::{
    booking::{BookingError, BookingFlow},
    db,
    forms::CommentForm,
    models::{format_datetime, status_label, RoomRow, ServiceRow, STATUS_PENDING},
    routes::{redirect_back, redirect_to},
    state::AppState,
    templates::{client_menu, render, Page},
};

#[derive(Clone, Debug)]
struct RoomCard {
    id: i64,
    slug: String,
    type_label: &'static str,
    price: String,
    image: String,
    description: String,
    is_liked: bool,
}

#[derive(Clone, Debug)]
struct ServiceOption {
    id: i64,
    title: String,
    description: String,
    price: String,
    checked: bool,
}

#[derive(Clone, Debug)]
struct CommentView {
    content: String,
    created: String,
}

#[derive(Clone, Debug)]
struct BookingCard {
    id: i64,
    room_slug: String,
    room_label: &'static str,
    client_name: String,
    start: String,
    end: String,
    total_price: String,
    status: &'static str,
    pending: bool,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    page: Page,
}

#[derive(Template)]
#[template(path = "rooms.html")]
struct RoomsTemplate {
    page: Page,
    rooms: Vec<RoomCard>,
}

#[derive(Template)]
#[template(path = "room.html")]
struct RoomTemplate {
    page: Page,
    room: RoomCard,
    reserved: bool,
    comments: Vec<CommentView>,
}

#[derive(Template)]
#[template(path = "bookings.html")]
struct BookingsTemplate {
    page: Page,
    bookings: Vec<BookingCard>,
}

#[derive(Template)]
#[template(path = "booking_form.html")]
struct BookingFormTemplate {
    page: Page,
    room: Option<RoomCard>,
    room_value: String,
    first_name: String,
    middle_name: String,
    last_name: String,
    email: String,
    start_book: String,
    end_book: String,
    services: Vec<ServiceOption>,
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct BookingQuery {
    room: Option<i64>,
}

#[derive(Deserialize)]
struct CommentPost {
    content: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(web::resource("/rooms/").route(web::get().to(list_rooms)))
        .service(web::resource("/rooms/favorites/").route(web::get().to(list_favorites)))
        .service(web::resource("/rooms/bookings/").route(web::get().to(list_bookings)))
        .service(web::resource("/rooms/{slug}/").route(web::get().to(room_detail)))
        .service(web::resource("/rooms/{slug}/like-room/").route(web::post().to(like_room)))
        .service(web::resource("/rooms/{slug}/unlike-room/").route(web::post().to(unlike_room)))
        .service(web::resource("/rooms/{slug}/post-comment/").route(web::post().to(post_comment)))
        .service(
            web::resource("/booking-room/")
                .route(web::get().to(show_booking_form))
                .route(web::post().to(create_booking)),
        )
        .service(web::resource("/delete-booking/{pk}/").route(web::post().to(delete_booking)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn page(state: &AppState, title: &str) -> Page {
    Page::new(title, client_menu(db::has_bookings(&state.db).await))
}

async fn home(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(render(HomeTemplate {
        page: page(&state, "Home Page").await,
    }))
}

async fn list_rooms(state: web::Data<AppState>) -> Result<HttpResponse> {
    let rooms = db::available_rooms(&state.db, false)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(render(RoomsTemplate {
        page: page(&state, "Available Rooms").await,
        rooms: rooms.into_iter().map(to_card).collect(),
    }))
}

async fn list_favorites(state: web::Data<AppState>) -> Result<HttpResponse> {
    let rooms = db::available_rooms(&state.db, true)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(render(RoomsTemplate {
        page: page(&state, "Favorite Rooms").await,
        rooms: rooms.into_iter().map(to_card).collect(),
    }))
}

async fn list_bookings(state: web::Data<AppState>) -> Result<HttpResponse> {
    let bookings = db::all_bookings(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let bookings = bookings
        .into_iter()
        .map(|row| BookingCard {
            id: row.id,
            room_slug: row.room_slug.clone(),
            room_label: row.room_type_label(),
            client_name: format!("{} {}", row.client_first_name, row.client_last_name),
            start: format_datetime(&row.start_book),
            end: format_datetime(&row.end_book),
            total_price: row.total_price.clone(),
            status: status_label(row.approve_status),
            pending: row.approve_status == STATUS_PENDING,
        })
        .collect();

    Ok(render(BookingsTemplate {
        page: page(&state, "Booked Rooms").await,
        bookings,
    }))
}

async fn room_detail(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let Some(room) = db::fetch_room_by_slug(&state.db, &slug).await else {
        return Ok(HttpResponse::NotFound().body("Room not found"));
    };

    let reserved = db::room_is_reserved(&state.db, room.id).await;
    let comments = db::comments_for_room(&state.db, room.id)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?
        .into_iter()
        .map(|row| CommentView {
            content: row.content,
            created: format_datetime(&row.created),
        })
        .collect();

    Ok(render(RoomTemplate {
        page: page(&state, "Room").await,
        room: to_card(room),
        reserved,
        comments,
    }))
}

async fn like_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    set_liked(&state, &path.into_inner(), true, &req).await
}

async fn unlike_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    set_liked(&state, &path.into_inner(), false, &req).await
}

async fn set_liked(
    state: &AppState,
    slug: &str,
    liked: bool,
    req: &HttpRequest,
) -> Result<HttpResponse> {
    let Some(room) = db::fetch_room_by_slug(&state.db, slug).await else {
        return Ok(HttpResponse::NotFound().body("Room not found"));
    };
    db::set_room_liked(&state.db, room.id, liked)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(redirect_back(req, "/rooms/"))
}

async fn post_comment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<CommentPost>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let Some(room) = db::fetch_room_by_slug(&state.db, &slug).await else {
        return Ok(HttpResponse::NotFound().body("Room not found"));
    };

    let comment = CommentForm {
        content: form.into_inner().content,
    };
    // An empty comment is silently dropped; the visitor just lands back
    // on the room page.
    if comment.validate().is_empty() {
        db::add_comment(&state.db, room.id, comment.content.trim())
            .await
            .map_err(actix_web::error::ErrorInternalServerError)?;
    }

    Ok(redirect_back(&req, &format!("/rooms/{slug}/")))
}

async fn show_booking_form(
    state: web::Data<AppState>,
    query: web::Query<BookingQuery>,
) -> Result<HttpResponse> {
    let room = match query.room {
        Some(id) => db::fetch_room_by_id(&state.db, id).await,
        None => None,
    };
    let services = db::all_services(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(render(BookingFormTemplate {
        page: page(&state, "Booking a Room").await,
        room_value: room.as_ref().map(|r| r.id.to_string()).unwrap_or_default(),
        room: room.map(to_card),
        first_name: String::new(),
        middle_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        start_book: String::new(),
        end_book: String::new(),
        services: service_options(services, &[]),
        errors: Vec::new(),
    }))
}

async fn create_booking(
    state: web::Data<AppState>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse> {
    let pairs = form.into_inner();
    let flow = BookingFlow::from_pairs(&pairs);

    let valid = match flow.validate(Utc::now()) {
        Ok(valid) => valid,
        Err(errors) => return rerender_booking_form(&state, &flow, errors.messages()).await,
    };

    match crate::booking::submit(&state.db, &valid).await {
        Ok(booking_id) => {
            log::info!("Booking {booking_id} created for room {}", valid.dates.room_id);
            Ok(redirect_to("/rooms/bookings/"))
        }
        Err(BookingError::RoomTaken) => {
            rerender_booking_form(&state, &flow, vec!["This room is already booked.".to_string()])
                .await
        }
        Err(BookingError::UnknownRoom) => {
            rerender_booking_form(
                &state,
                &flow,
                vec!["Please choose an available room.".to_string()],
            )
            .await
        }
        Err(BookingError::UnknownService) => {
            rerender_booking_form(
                &state,
                &flow,
                vec!["One of the selected services is not available.".to_string()],
            )
            .await
        }
        Err(BookingError::Db(err)) => Err(actix_web::error::ErrorInternalServerError(err)),
    }
}

async fn rerender_booking_form(
    state: &AppState,
    flow: &BookingFlow,
    errors: Vec<String>,
) -> Result<HttpResponse> {
    let room = match flow.booking.room.parse::<i64>() {
        Ok(id) => db::fetch_room_by_id(&state.db, id).await,
        Err(_) => None,
    };
    let services = db::all_services(&state.db)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(render(BookingFormTemplate {
        page: page(state, "Booking a Room").await,
        room_value: flow.booking.room.clone(),
        room: room.map(to_card),
        first_name: flow.client.first_name.clone(),
        middle_name: flow.client.middle_name.clone(),
        last_name: flow.client.last_name.clone(),
        email: flow.client.email.clone(),
        start_book: flow.booking.start_book.clone(),
        end_book: flow.booking.end_book.clone(),
        services: service_options(services, &flow.booking.services),
        errors,
    }))
}

async fn delete_booking(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let deleted = db::delete_booking(&state.db, path.into_inner())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    if !deleted {
        return Ok(HttpResponse::NotFound().body("Booking not found"));
    }
    Ok(redirect_back(&req, "/rooms/bookings/"))
}

fn to_card(row: RoomRow) -> RoomCard {
    RoomCard {
        id: row.id,
        slug: row.slug.clone(),
        type_label: row.type_label(),
        price: row.price.clone(),
        image: row.image.clone(),
        description: row.description.clone(),
        is_liked: row.is_liked == 1,
    }
}

fn service_options(services: Vec<ServiceRow>, selected: &[String]) -> Vec<ServiceOption> {
    services
        .into_iter()
        .map(|service| ServiceOption {
            checked: selected.iter().any(|raw| raw == &service.id.to_string()),
            id: service.id,
            title: service.title,
            description: service.description,
            price: service.price,
        })
        .collect()
}
