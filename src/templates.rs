use actix_web::HttpResponse;
use askama::Template;

pub fn render<T: Template>(template: T) -> HttpResponse {
    match template.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Template render error: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Page chrome shared by every template: a title plus the navigation
/// menu for the current surface.
#[derive(Clone, Debug)]
pub struct Page {
    pub title: String,
    pub menu: Vec<MenuItem>,
}

impl Page {
    pub fn new(title: &str, menu: Vec<MenuItem>) -> Self {
        Self {
            title: title.to_string(),
            menu,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MenuItem {
    pub href: &'static str,
    pub label: &'static str,
}

pub fn admin_menu() -> Vec<MenuItem> {
    vec![
        MenuItem {
            href: "/hotel-admins/",
            label: "Home",
        },
        MenuItem {
            href: "/hotel-admins/rooms/",
            label: "Rooms",
        },
        MenuItem {
            href: "/hotel-admins/requests/",
            label: "Requests",
        },
        MenuItem {
            href: "/hotel-admins/add-room/",
            label: "Add Room",
        },
    ]
}

/// Client menu. The Bookings entry only appears once at least one
/// booking exists.
pub fn client_menu(has_bookings: bool) -> Vec<MenuItem> {
    let mut menu = vec![
        MenuItem {
            href: "/",
            label: "Home",
        },
        MenuItem {
            href: "/rooms/",
            label: "Rooms",
        },
        MenuItem {
            href: "/rooms/favorites/",
            label: "Favorites",
        },
    ];
    if has_bookings {
        menu.push(MenuItem {
            href: "/rooms/bookings/",
            label: "Bookings",
        });
    }
    menu
}
