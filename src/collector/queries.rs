//! SQL issued against the `SNOWFLAKE.ACCOUNT_USAGE` views.
//!
//! Column order in each SELECT list is what the matching group decodes.

pub const STORAGE: &str = "SELECT STORAGE_BYTES, STAGE_BYTES, FAILSAFE_BYTES \
FROM ACCOUNT_USAGE.STORAGE_USAGE \
ORDER BY USAGE_DATE DESC LIMIT 1;";

pub const DATABASE_STORAGE: &str = "SELECT DATABASE_NAME, DATABASE_ID, AVERAGE_DATABASE_BYTES, AVERAGE_FAILSAFE_BYTES \
FROM ACCOUNT_USAGE.DATABASE_STORAGE_USAGE_HISTORY \
WHERE USAGE_DATE = (SELECT MAX(USAGE_DATE) FROM ACCOUNT_USAGE.DATABASE_STORAGE_USAGE_HISTORY) \
AND DELETED IS NULL;";

pub const CREDITS: &str = "SELECT SERVICE_TYPE, NAME, AVG(CREDITS_USED_COMPUTE), AVG(CREDITS_USED_CLOUD_SERVICES) \
FROM ACCOUNT_USAGE.METERING_HISTORY \
WHERE START_TIME >= DATEADD(hour, -24, CURRENT_TIMESTAMP()) \
GROUP BY SERVICE_TYPE, NAME;";

pub const WAREHOUSE_CREDITS: &str = "SELECT WAREHOUSE_NAME, WAREHOUSE_ID, AVG(CREDITS_USED_COMPUTE), AVG(CREDITS_USED_CLOUD_SERVICES) \
FROM ACCOUNT_USAGE.WAREHOUSE_METERING_HISTORY \
WHERE START_TIME >= DATEADD(hour, -24, CURRENT_TIMESTAMP()) \
GROUP BY WAREHOUSE_NAME, WAREHOUSE_ID;";

pub const LOGINS: &str = "SELECT REPORTED_CLIENT_TYPE, REPORTED_CLIENT_VERSION, \
SUM(IFF(IS_SUCCESS = 'NO', 1, 0)) AS FAILURES, \
SUM(IFF(IS_SUCCESS = 'YES', 1, 0)) AS SUCCESSES, \
COUNT(*) AS TOTAL \
FROM ACCOUNT_USAGE.LOGIN_HISTORY \
WHERE EVENT_TIMESTAMP >= DATEADD(hour, -24, CURRENT_TIMESTAMP()) \
GROUP BY REPORTED_CLIENT_TYPE, REPORTED_CLIENT_VERSION;";

pub const WAREHOUSE_LOAD: &str = "SELECT WAREHOUSE_NAME, WAREHOUSE_ID, AVG(AVG_RUNNING), AVG(AVG_QUEUED_LOAD), AVG(AVG_QUEUED_PROVISIONING), AVG(AVG_BLOCKED) \
FROM ACCOUNT_USAGE.WAREHOUSE_LOAD_HISTORY \
WHERE START_TIME >= DATEADD(hour, -24, CURRENT_TIMESTAMP()) \
GROUP BY WAREHOUSE_NAME, WAREHOUSE_ID;";

pub const AUTO_CLUSTERING: &str = "SELECT TABLE_NAME, TABLE_ID, SCHEMA_NAME, SCHEMA_ID, DATABASE_NAME, DATABASE_ID, \
SUM(CREDITS_USED), SUM(NUM_BYTES_RECLUSTERED), SUM(NUM_ROWS_RECLUSTERED) \
FROM ACCOUNT_USAGE.AUTOMATIC_CLUSTERING_HISTORY \
WHERE START_TIME >= DATEADD(hour, -24, CURRENT_TIMESTAMP()) \
GROUP BY TABLE_NAME, TABLE_ID, SCHEMA_NAME, SCHEMA_ID, DATABASE_NAME, DATABASE_ID;";

pub const TABLE_STORAGE: &str = "SELECT TABLE_NAME, ID, TABLE_SCHEMA, TABLE_SCHEMA_ID, TABLE_CATALOG, TABLE_CATALOG_ID, \
SUM(ACTIVE_BYTES), SUM(TIME_TRAVEL_BYTES), SUM(FAILSAFE_BYTES), SUM(RETAINED_FOR_CLONE_BYTES) \
FROM ACCOUNT_USAGE.TABLE_STORAGE_METRICS \
GROUP BY TABLE_NAME, ID, TABLE_SCHEMA, TABLE_SCHEMA_ID, TABLE_CATALOG, TABLE_CATALOG_ID;";

pub const TABLE_STORAGE_EXCLUDE_DELETED: &str = "SELECT TABLE_NAME, ID, TABLE_SCHEMA, TABLE_SCHEMA_ID, TABLE_CATALOG, TABLE_CATALOG_ID, \
SUM(ACTIVE_BYTES), SUM(TIME_TRAVEL_BYTES), SUM(FAILSAFE_BYTES), SUM(RETAINED_FOR_CLONE_BYTES) \
FROM ACCOUNT_USAGE.TABLE_STORAGE_METRICS \
WHERE DELETED = FALSE \
GROUP BY TABLE_NAME, ID, TABLE_SCHEMA, TABLE_SCHEMA_ID, TABLE_CATALOG, TABLE_CATALOG_ID;";

pub const DELETED_TABLES: &str = "SELECT COUNT(*) \
FROM ACCOUNT_USAGE.TABLE_STORAGE_METRICS \
WHERE DELETED = TRUE;";

pub const REPLICATION: &str = "SELECT DATABASE_NAME, DATABASE_ID, SUM(CREDITS_USED), SUM(BYTES_TRANSFERRED) \
FROM ACCOUNT_USAGE.REPLICATION_USAGE_HISTORY \
WHERE START_TIME >= DATEADD(hour, -24, CURRENT_TIMESTAMP()) \
GROUP BY DATABASE_NAME, DATABASE_ID;";
