//! Field-level validation for the HTML forms.
//!
//! Each raw form deserializes straight from the request body; `validate`
//! returns either a cleaned value or the list of messages to re-render
//! alongside the form. Uniqueness checks that need the database stay in
//! the handlers.

use serde::Deserialize;

use crate::model::parse_money_cents;

pub const MIN_PASSWORD_LEN: usize = 8;

fn none_if_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(self) -> Result<RegisterInput, Vec<String>> {
        let mut errors = Vec::new();

        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.push("El nombre de usuario es obligatorio".to_string());
        }

        if self.password1.len() < MIN_PASSWORD_LEN {
            errors.push(format!(
                "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
            ));
        }
        if self.password1 != self.password2 {
            errors.push("Las contraseñas no coinciden".to_string());
        }

        if errors.is_empty() {
            Ok(RegisterInput {
                username,
                email: none_if_blank(self.email),
                password: self.password1,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub kind: Option<String>,
    pub price: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub stock: String,
    #[serde(default)]
    pub is_active: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub kind: Option<String>,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub stock: i64,
    pub is_active: bool,
}

impl ProductForm {
    pub fn validate(self) -> Result<ProductInput, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push("El nombre del producto es obligatorio".to_string());
        }

        let category_id = self.category_id.trim().parse::<i64>().unwrap_or_else(|_| {
            errors.push("La categoría es obligatoria".to_string());
            0
        });

        let price_cents = match parse_money_cents(&self.price) {
            Some(cents) if cents > 0 => cents,
            _ => {
                errors.push("El precio debe ser mayor a 0".to_string());
                0
            }
        };

        let stock = match self.stock.trim().parse::<i64>() {
            Ok(stock) if stock >= 0 => stock,
            _ => {
                errors.push("El stock no puede ser negativo".to_string());
                0
            }
        };

        if errors.is_empty() {
            Ok(ProductInput {
                name,
                description: none_if_blank(self.description),
                category_id,
                kind: none_if_blank(self.kind),
                price_cents,
                image_url: none_if_blank(self.image_url),
                stock,
                is_active: self.is_active.is_some(),
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl CategoryForm {
    pub fn validate(self) -> Result<CategoryInput, Vec<String>> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(vec!["El nombre de la categoría es obligatorio".to_string()]);
        }
        Ok(CategoryInput {
            name,
            description: none_if_blank(self.description),
            image_url: none_if_blank(self.image_url),
            is_active: self.is_active.is_some(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreateForm {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password1: String,
    pub password2: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserCreateInput {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub role: crate::model::Role,
}

impl UserCreateForm {
    pub fn validate(self) -> Result<UserCreateInput, Vec<String>> {
        use std::str::FromStr;

        let mut errors = Vec::new();

        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.push("El nombre de usuario es obligatorio".to_string());
        }
        if self.password1.len() < MIN_PASSWORD_LEN {
            errors.push(format!(
                "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
            ));
        }
        if self.password1 != self.password2 {
            errors.push("Las contraseñas no coinciden".to_string());
        }

        let role = match self.role.as_deref() {
            None | Some("") => crate::model::Role::Customer,
            Some(raw) => crate::model::Role::from_str(raw).unwrap_or_else(|_| {
                errors.push("Rol desconocido".to_string());
                crate::model::Role::Customer
            }),
        };

        if errors.is_empty() {
            Ok(UserCreateInput {
                username,
                email: none_if_blank(self.email),
                password: self.password1,
                role,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserEditForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserEditInput {
    pub email: Option<String>,
    pub role: crate::model::Role,
    pub is_active: bool,
}

impl UserEditForm {
    pub fn validate(self) -> Result<UserEditInput, Vec<String>> {
        use std::str::FromStr;

        let role = match self.role.as_deref() {
            None | Some("") => crate::model::Role::Customer,
            Some(raw) => {
                crate::model::Role::from_str(raw).map_err(|_| vec!["Rol desconocido".to_string()])?
            }
        };

        Ok(UserEditInput {
            email: none_if_blank(self.email),
            role,
            is_active: self.is_active.is_some(),
        })
    }
}
