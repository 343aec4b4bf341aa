use serde_json::{json, Map, Value};

use crate::database::models::{GeneratedContent, Material, MaterialWithContent, User};

/// Public wire format of a user
/// { _id, authId, email, createdAt, updatedAt }
pub fn user_to_api_value(user: &User) -> Value {
    json!({
        "_id": user.id,
        "authId": user.auth_id,
        "email": user.email,
        "createdAt": user.created_at,
        "updatedAt": user.updated_at,
    })
}

/// Registration reply; only identifying fields
pub fn registered_user_value(user: &User) -> Value {
    json!({
        "_id": user.id,
        "authId": user.auth_id,
        "email": user.email,
    })
}

/// { _id, id, user, fileName, storagePath, fileType, createdAt, updatedAt }
pub fn material_to_api_value(material: &Material) -> Value {
    Value::Object(material_fields(material))
}

pub fn materials_to_api_values(materials: &[Material]) -> Vec<Value> {
    materials.iter().map(material_to_api_value).collect()
}

/// Material fields plus a nested `generatedContent` array
pub fn material_with_content_value(entry: &MaterialWithContent) -> Value {
    let mut obj = material_fields(&entry.material);
    obj.insert(
        "generatedContent".into(),
        Value::Array(contents_to_api_values(&entry.generated_content)),
    );
    Value::Object(obj)
}

pub fn materials_with_content_values(entries: &[MaterialWithContent]) -> Vec<Value> {
    entries.iter().map(material_with_content_value).collect()
}

/// { _id, material, user, type, content, createdAt, updatedAt }
pub fn content_to_api_value(content: &GeneratedContent) -> Value {
    json!({
        "_id": content.id,
        "material": content.material_id,
        "user": content.user_id,
        "type": content.kind,
        "content": content.content,
        "createdAt": content.created_at,
        "updatedAt": content.updated_at,
    })
}

pub fn contents_to_api_values(contents: &[GeneratedContent]) -> Vec<Value> {
    contents.iter().map(content_to_api_value).collect()
}

fn material_fields(material: &Material) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("_id".into(), json!(material.id));
    obj.insert("id".into(), json!(material.id));
    obj.insert("user".into(), json!(material.user_id));
    obj.insert("fileName".into(), json!(material.file_name));
    obj.insert("storagePath".into(), json!(material.storage_path));
    obj.insert("fileType".into(), json!(material.file_type));
    obj.insert("createdAt".into(), json!(material.created_at));
    obj.insert("updatedAt".into(), json!(material.updated_at));
    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ContentKind, FileType, NewGeneratedContent, NewMaterial};
    use uuid::Uuid;

    #[test]
    fn test_material_carries_both_id_keys_and_nested_content() {
        let material = NewMaterial {
            user_id: Uuid::new_v4(),
            file_name: "notes.pdf".to_string(),
            storage_path: "u/notes.pdf".to_string(),
            file_type: FileType::Pdf,
        }
        .into_material();
        let summary = NewGeneratedContent {
            material_id: material.id,
            user_id: material.user_id,
            kind: ContentKind::Summary,
            content: "short".to_string(),
        }
        .into_content();

        let value = material_with_content_value(&MaterialWithContent {
            material: material.clone(),
            generated_content: vec![summary],
        });

        assert_eq!(value["_id"], value["id"]);
        assert_eq!(value["user"], json!(material.user_id));
        assert_eq!(value["fileType"], "pdf");
        assert_eq!(value["generatedContent"][0]["type"], "summary");
        assert_eq!(value["generatedContent"][0]["material"], json!(material.id));
    }
}
