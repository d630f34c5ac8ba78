use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use server::entity::image;

use crate::common::{ALICE, BOB, PNG_BYTES, TestApp, png_part, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn owner_can_upload_a_png() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let form = reqwest::multipart::Form::new().part("image", png_part("front.png"));
        let res = app
            .post_multipart(&routes::images(product_id), form, Some(ALICE))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["image_id"].is_number());
        assert_eq!(res.body["product_id"], product_id);
        assert_eq!(res.body["file_name"], "front.png");
        assert!(res.body["date_created"].is_string());

        // The blob actually landed under the minted locator.
        let locator = res.body["s3_bucket_path"].as_str().unwrap();
        assert!(locator.ends_with("/front.png"));
        let blob_path = app.blob_root.join(locator);
        assert_eq!(std::fs::read(blob_path).unwrap(), PNG_BYTES);
    }

    #[tokio::test]
    async fn jpeg_is_accepted() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let part = reqwest::multipart::Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
            .file_name("shot.jpg")
            .mime_str("image/jpeg")
            .unwrap();
        let form = reqwest::multipart::Form::new().part("image", part);
        let res = app
            .post_multipart(&routes::images(product_id), form, Some(ALICE))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn unsupported_content_type_is_rejected() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let part = reqwest::multipart::Part::bytes(b"%PDF-1.4".to_vec())
            .file_name("manual.pdf")
            .mime_str("application/pdf")
            .unwrap();
        let form = reqwest::multipart::Form::new().part("image", part);
        let res = app
            .post_multipart(&routes::images(product_id), form, Some(ALICE))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let res = app
            .post_multipart(&routes::images(product_id), form, Some(ALICE))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "NO_FILE_PROVIDED");
    }

    #[tokio::test]
    async fn a_second_file_is_rejected() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let form = reqwest::multipart::Form::new()
            .part("image", png_part("one.png"))
            .part("image", png_part("two.png"));
        let res = app
            .post_multipart(&routes::images(product_id), form, Some(ALICE))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "TOO_MANY_FILES");
    }

    #[tokio::test]
    async fn upload_to_missing_product_is_not_found() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;

        let form = reqwest::multipart::Form::new().part("image", png_part("front.png"));
        let res = app.post_multipart(&routes::images(999), form, Some(ALICE)).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn upload_by_non_owner_is_forbidden() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let form = reqwest::multipart::Form::new().part("image", png_part("front.png"));
        let res = app
            .post_multipart(&routes::images(product_id), form, Some(BOB))
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn upload_requires_authentication() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let form = reqwest::multipart::Form::new().part("image", png_part("front.png"));
        let res = app.post_multipart(&routes::images(product_id), form, None).await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn locators_are_unique_per_upload() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let first = app.upload_png(ALICE, product_id, "front.png").await;
        let second = app.upload_png(ALICE, product_id, "front.png").await;

        assert_ne!(first["s3_bucket_path"], second["s3_bucket_path"]);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn owner_can_list_images() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;
        app.upload_png(ALICE, product_id, "a.png").await;
        app.upload_png(ALICE, product_id, "b.png").await;

        let res = app.get(&routes::images(product_id), Some(ALICE)).await;

        assert_eq!(res.status, 200);
        let list = res.body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["file_name"], "a.png");
        assert_eq!(list[1]["file_name"], "b.png");
    }

    #[tokio::test]
    async fn owner_can_get_a_single_image() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;
        let uploaded = app.upload_png(ALICE, product_id, "front.png").await;
        let image_id = uploaded["image_id"].as_i64().unwrap();

        let res = app
            .get(&routes::image(product_id, image_id), Some(ALICE))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["file_name"], "front.png");
        assert_eq!(res.body["s3_bucket_path"], uploaded["s3_bucket_path"]);
    }

    #[tokio::test]
    async fn image_of_another_product_is_not_found() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let first = app.create_product(ALICE, "wid-001").await;
        let second = app.create_product(ALICE, "wid-002").await;
        let uploaded = app.upload_png(ALICE, first, "front.png").await;
        let image_id = uploaded["image_id"].as_i64().unwrap();

        // Same owner, wrong product in the path.
        let res = app.get(&routes::image(second, image_id), Some(ALICE)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "IMAGE_NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_image_is_not_found() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let res = app.get(&routes::image(product_id, 999), Some(ALICE)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "IMAGE_NOT_FOUND");
    }

    #[tokio::test]
    async fn listing_by_non_owner_is_forbidden() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let res = app.get(&routes::images(product_id), Some(BOB)).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn listing_requires_authentication() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;

        let res = app.get(&routes::images(product_id), None).await;

        assert_eq!(res.status, 401);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn owner_can_delete_an_image() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;
        let uploaded = app.upload_png(ALICE, product_id, "front.png").await;
        let image_id = uploaded["image_id"].as_i64().unwrap();
        let blob_path = app
            .blob_root
            .join(uploaded["s3_bucket_path"].as_str().unwrap());
        assert!(blob_path.exists());

        let res = app
            .delete(&routes::image(product_id, image_id), Some(ALICE))
            .await;
        assert_eq!(res.status, 204);

        // Row and blob are both gone.
        let listed = app.get(&routes::images(product_id), Some(ALICE)).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 0);
        assert!(!blob_path.exists());
    }

    #[tokio::test]
    async fn deleting_a_product_removes_every_blob_and_row() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;
        let first = app.upload_png(ALICE, product_id, "a.png").await;
        let second = app.upload_png(ALICE, product_id, "b.png").await;

        let first_path = app.blob_root.join(first["s3_bucket_path"].as_str().unwrap());
        let second_path = app
            .blob_root
            .join(second["s3_bucket_path"].as_str().unwrap());

        let res = app.delete(&routes::product(product_id), Some(ALICE)).await;
        assert_eq!(res.status, 204);

        assert!(!first_path.exists());
        assert!(!second_path.exists());

        let remaining = image::Entity::find()
            .filter(image::Column::ProductId.eq(product_id as i32))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn missing_blob_does_not_abort_the_cascade() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;
        let first = app.upload_png(ALICE, product_id, "a.png").await;
        let second = app.upload_png(ALICE, product_id, "b.png").await;

        // One blob vanishes out-of-band before the cascade runs.
        let first_path = app.blob_root.join(first["s3_bucket_path"].as_str().unwrap());
        std::fs::remove_file(&first_path).unwrap();

        let res = app.delete(&routes::product(product_id), Some(ALICE)).await;
        assert_eq!(res.status, 204);

        let second_path = app
            .blob_root
            .join(second["s3_bucket_path"].as_str().unwrap());
        assert!(!second_path.exists());

        let fetched = app.get(&routes::product(product_id), None).await;
        assert_eq!(fetched.status, 404);
    }

    #[tokio::test]
    async fn deleting_an_image_of_another_product_is_not_found() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let first = app.create_product(ALICE, "wid-001").await;
        let second = app.create_product(ALICE, "wid-002").await;
        let uploaded = app.upload_png(ALICE, first, "front.png").await;
        let image_id = uploaded["image_id"].as_i64().unwrap();

        let res = app
            .delete(&routes::image(second, image_id), Some(ALICE))
            .await;

        assert_eq!(res.status, 404);

        // The image is untouched.
        let still_there = app.get(&routes::image(first, image_id), Some(ALICE)).await;
        assert_eq!(still_there.status, 200);
    }

    #[tokio::test]
    async fn deleting_by_non_owner_is_forbidden() {
        let app = TestApp::spawn().await;
        app.register_default_users().await;
        let product_id = app.create_product(ALICE, "wid-001").await;
        let uploaded = app.upload_png(ALICE, product_id, "front.png").await;
        let image_id = uploaded["image_id"].as_i64().unwrap();

        let res = app
            .delete(&routes::image(product_id, image_id), Some(BOB))
            .await;

        assert_eq!(res.status, 403);
    }
}
