use std::{fs, path::Path};

use actix_multipart::Multipart;
use actix_web::web;
use chrono::Utc;
use futures_util::TryStreamExt;
use uuid::Uuid;

use crate::forms::RoomForm;

/// Reads the multipart add-room submission. Text fields fill the form;
/// an uploaded image is written under a date-partitioned media path and
/// its relative path recorded. An empty file part means no upload.
pub async fn read_room_form(
    mut payload: Multipart,
    media_root: &Path,
) -> Result<RoomForm, actix_web::Error> {
    let mut form = RoomForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().to_string();
        let filename = field
            .content_disposition()
            .get_filename()
            .map(|value| value.to_string());

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "image" => {
                let Some(filename) = filename.filter(|f| !f.trim().is_empty()) else {
                    continue;
                };
                if bytes.is_empty() {
                    continue;
                }
                let stored = web::block({
                    let media_root = media_root.to_path_buf();
                    move || store_image(&media_root, &filename, &bytes)
                })
                .await?
                .map_err(actix_web::error::ErrorInternalServerError)?;
                form.image = Some(stored);
            }
            "room_type" => form.room_type = text(bytes),
            "price" => form.price = text(bytes),
            "description" => form.description = text(bytes),
            _ => {}
        }
    }

    Ok(form)
}

fn text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_default().trim().to_string()
}

/// Writes the upload to `<media_root>/rooms/%Y/%m/%d/<uuid>.<ext>` and
/// returns the media-relative path.
pub fn store_image(media_root: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<String> {
    let partition = format!("rooms/{}", Utc::now().format("%Y/%m/%d"));
    let dir = media_root.join(&partition);
    fs::create_dir_all(&dir)?;

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("png");
    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);

    fs::write(dir.join(&stored_name), bytes)?;
    Ok(format!("{partition}/{stored_name}"))
}
