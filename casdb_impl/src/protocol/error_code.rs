//! Resolves a human-readable message for a server error code when the server itself
//! sent an empty message (spec §4.2: "When the error message is empty, the decoder
//! resolves a human-readable text from an error-code table").

/// Looks up a default message for `code`. Returns a generic fallback for codes not in
/// the table rather than failing — a resolvable message is always preferable to none.
pub fn resolve_message(code: i32) -> String {
    match code {
        -1001 => "CAS_ER_DBMS".to_string(),
        -1002 => "CAS_ER_INTERNAL".to_string(),
        -1003 => "CAS_ER_NO_MORE_MEMORY".to_string(),
        -1004 => "CAS_ER_COMMUNICATION".to_string(),
        -1005 => "CAS_ER_ARGS".to_string(),
        -1006 => "CAS_ER_TRAN_TYPE".to_string(),
        -1007 => "CAS_ER_SRV_HANDLE".to_string(),
        -1008 => "CAS_ER_NUM_BIND".to_string(),
        -1009 => "CAS_ER_UNKNOWN_U_TYPE".to_string(),
        -1010 => "CAS_ER_DB_VALUE".to_string(),
        -1011 => "CAS_ER_TYPE_CONVERSION".to_string(),
        -1012 => "CAS_ER_NO_MORE_DATA".to_string(),
        -1013 => "CAS_ER_OBJECT".to_string(),
        -1014 => "CAS_ER_OPEN_FILE".to_string(),
        -1015 => "CAS_ER_SCHEMA_TYPE".to_string(),
        -1016 => "CAS_ER_VERSION".to_string(),
        -1017 => "CAS_ER_FREE_SERVER".to_string(),
        -1018 => "CAS_ER_NOT_AUTHORIZED_CLIENT".to_string(),
        -1019 => "CAS_ER_QUERY_CANCEL".to_string(),
        -1020 => "CAS_ER_NOT_COLLECTION".to_string(),
        -1021 => "CAS_ER_COLLECTION_DOMAIN".to_string(),
        -1022 => "CAS_ER_NO_MORE_RESULT_SET".to_string(),
        -1023 => "CAS_ER_INVALID_CALL_STMT".to_string(),
        -1024 => "CAS_ER_STMT_POOLING".to_string(),
        -1025 => "CAS_ER_DBSERVER_DISCONNECTED".to_string(),
        _ => format!("unrecognized server error code {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_code() {
        assert_eq!(resolve_message(-1012), "CAS_ER_NO_MORE_DATA");
    }

    #[test]
    fn falls_back_for_unknown_code() {
        assert!(resolve_message(-9999).contains("-9999"));
    }
}
