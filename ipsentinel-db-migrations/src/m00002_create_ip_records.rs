use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod ip_record {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "ip_records")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub address: String,
        pub created_at: DateTime<Utc>,
        pub added_by: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00002_create_ip_records"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);
        manager
            .create_table(schema.create_table_from_entity(ip_record::Entity))
            .await?;

        // Newest-first listing in the admin console
        manager
            .create_index(
                Index::create()
                    .table(ip_record::Entity)
                    .name("idx_ip_records_created_at")
                    .col(ip_record::Column::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(ip_record::Entity)
                    .name("idx_ip_records_created_at")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(ip_record::Entity).to_owned())
            .await
    }
}
