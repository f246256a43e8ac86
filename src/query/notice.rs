//! User-visible outcome messages for mutations, in the dashboard's language (pt-BR).

use std::fmt;

use serde::Serialize;

use super::cache::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success<S: Into<String>>(msg: S) -> Self {
        Self { level: NoticeLevel::Success, message: msg.into() }
    }

    pub fn error<S: Into<String>>(msg: S) -> Self {
        Self { level: NoticeLevel::Error, message: msg.into() }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

pub fn success_message(resource: Resource, op: Operation) -> &'static str {
    use Operation::*;
    use Resource::*;
    match (resource, op) {
        (Users, Create) => "Usuário criado com sucesso",
        (Users, Update) => "Usuário atualizado com sucesso",
        (Users, Delete) => "Usuário removido com sucesso",
        (Factions, Create) => "Facção criada com sucesso",
        (Factions, Update) => "Facção atualizada com sucesso",
        (Factions, Delete) => "Facção removida com sucesso",
        (Geometries, Create) => "Geometria criada com sucesso",
        (Geometries, Update) => "Geometria atualizada com sucesso",
        (Geometries, Delete) => "Geometria removida com sucesso",
        // regions are read-only
        (Regions, _) => "Operação concluída com sucesso",
    }
}

pub fn failure_message(resource: Resource, op: Operation) -> &'static str {
    use Operation::*;
    use Resource::*;
    match (resource, op) {
        (Users, Create) => "Erro ao criar usuário",
        (Users, Update) => "Erro ao atualizar usuário",
        (Users, Delete) => "Erro ao remover usuário",
        (Factions, Create) => "Erro ao criar facção",
        (Factions, Update) => "Erro ao atualizar facção",
        (Factions, Delete) => "Erro ao remover facção",
        (Geometries, Create) => "Erro ao criar geometria",
        (Geometries, Update) => "Erro ao atualizar geometria",
        (Geometries, Delete) => "Erro ao remover geometria",
        (Regions, _) => "Erro ao processar a operação",
    }
}
